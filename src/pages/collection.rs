//! Loading a manual's page images from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::PageError;
use super::index::PageIndex;

/// File extensions treated as page images.
const PAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// One page image of the manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    path: PathBuf,
    file_name: String,
    size_bytes: u64,
}

impl PageContent {
    /// Creates page content for an image file.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            file_name,
            size_bytes,
        }
    }

    /// Returns the path of the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name of the image.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the image size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Ordered page images of a single manual.
///
/// Owns every [`PageContent`]; the page at position `i` is page `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct PageCollection {
    pages: Vec<PageContent>,
}

impl PageCollection {
    /// Creates a collection from pages already in reading order.
    pub fn new(pages: Vec<PageContent>) -> Self {
        Self { pages }
    }

    /// Loads every page image in `dir`.
    ///
    /// Pages are ordered by the first number in their file name, so
    /// `page-2.png` comes before `page-10.png`. Files without a number sort
    /// last, by name.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Io`] if the directory cannot be read and
    /// [`PageError::NoPages`] if it holds no page images.
    pub fn load(dir: &Path) -> Result<Self, PageError> {
        let mut pages = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let entry = entry.map_err(io_error(dir))?;
            let path = entry.path();
            if !is_page_image(&path) {
                continue;
            }
            let metadata = entry.metadata().map_err(io_error(&path))?;
            if metadata.is_file() {
                pages.push(PageContent::new(path, metadata.len()));
            }
        }

        if pages.is_empty() {
            return Err(PageError::NoPages {
                dir: dir.to_path_buf(),
            });
        }

        pages.sort_by(|a, b| page_sort_key(a.file_name()).cmp(&page_sort_key(b.file_name())));
        log::debug!("Loaded {} pages from {}", pages.len(), dir.display());

        Ok(Self { pages })
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if the collection holds no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the content of a page.
    pub fn get(&self, index: PageIndex) -> Option<&PageContent> {
        self.pages.get(index.offset())
    }

    /// Returns all pages in order.
    pub fn as_slice(&self) -> &[PageContent] {
        &self.pages
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PageError {
    let path = path.to_path_buf();
    move |source| PageError::Io { path, source }
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn page_sort_key(file_name: &str) -> (bool, u64, &str) {
    let number = file_name
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse::<u64>().ok());

    match number {
        Some(n) => (false, n, file_name),
        None => (true, 0, file_name),
    }
}
