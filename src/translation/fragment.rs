/*!
 * Source fragments consumed by the translation pipeline.
 */

/// Marks whether the segmentation may cut right before or after a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Incision {
    /// A cut is welcome here (e.g. a paragraph break)
    Possible,
    /// A cut should be avoided here
    Impossible,
    /// No preference
    #[default]
    Unset,
}

/// One atomic unit of source text eligible for translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Text content
    pub text: String,

    /// Incision before this fragment
    pub start_incision: Incision,

    /// Incision after this fragment
    pub end_incision: Incision,
}

impl Fragment {
    /// Create a fragment without any incision preference
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_incisions(text, Incision::Unset, Incision::Unset)
    }

    /// Create a fragment with explicit incisions
    pub fn with_incisions(text: impl Into<String>, start_incision: Incision, end_incision: Incision) -> Self {
        Self {
            text: text.into(),
            start_incision,
            end_incision,
        }
    }
}
