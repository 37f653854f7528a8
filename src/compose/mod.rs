//! Frame composition: text shaping, value formatting and the static/dynamic layer split.

pub(crate) mod compositor;
pub(crate) mod format;
pub(crate) mod plan;
pub(crate) mod text;
