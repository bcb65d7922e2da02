use crate::ItemId;

/// A row of a managed collection, addressable by a stable id.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &ItemId;
}
