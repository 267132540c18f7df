/// Data-source clients. Each provider gets its own file under `ingest/`.
///
/// - `ea`       — Environment Agency flood-monitoring readings (CSV + JSON)
/// - `fixtures` — (test only) representative response payloads

pub mod ea;

#[cfg(test)]
pub(crate) mod fixtures;
