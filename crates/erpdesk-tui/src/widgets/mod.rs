//! Small rendering helpers shared by screens.

pub mod popup;
pub mod sub_tabs;
pub mod text_fmt;
