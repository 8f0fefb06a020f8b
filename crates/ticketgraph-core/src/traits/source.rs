use crate::types::DataSource;

/// Host capability: start delivering logs from a newly created event contract
///
/// The projection never subscribes by itself; it emits a registration and the
/// host decides how to honour it (an in-process filter, an RPC log
/// subscription, a subgraph template...).
pub trait SourceRegistrar {
    /// Register `source`. Returns `false` if the address was already known.
    fn register_source(&mut self, source: DataSource) -> bool;
}

impl<F> SourceRegistrar for F
where
    F: FnMut(DataSource) -> bool,
{
    fn register_source(&mut self, source: DataSource) -> bool {
        self(source)
    }
}
