use crate::model::ModelHandle;

/// Opaque identifier of the object template a prop was instantiated from.
///
/// The runtime only stores it so callers can map props back to their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateId(pub u32);

/// A child model attached to one prop point of its parent's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    pub(crate) point: usize,
    pub(crate) model: ModelHandle,
    pub template: Option<TemplateId>,
}

impl Prop {
    /// Index into the parent geometry's prop points.
    #[inline]
    #[must_use]
    pub fn point(&self) -> usize {
        self.point
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> ModelHandle {
        self.model
    }
}
