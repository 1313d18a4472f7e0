//! Page validation and layout for the manual's page images.
//!
//! [`select`] checks page numbers against the page count without touching
//! page content. [`render`] resolves the surviving indices against a
//! [`PageCollection`] and lays them out in a fixed-column grid.

mod collection;
mod error;
mod index;
mod renderer;
mod selector;

pub use collection::{PageCollection, PageContent};
pub use error::PageError;
pub use index::PageIndex;
pub use renderer::{Cell, Grid, render};
pub use selector::{
    DisplayRequest, IndexCheck, Selection, SkipReason, SkippedInput, check_index, select,
    select_references,
};
