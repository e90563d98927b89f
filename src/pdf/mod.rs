//! Result and failure types yielded by the batch scheduler, plus the
//! injected-CSS byte templates that give every document its margins and
//! forced appearance.

use std::time::Duration;

use crate::config::{Appearance, Margins, PaginationMode};
use crate::error::RenderError;

/// One document handed to a batch, paired with its intended destination.
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw HTML bytes to render.
    pub html: Vec<u8>,
    /// Where the rendered PDF should be written.
    pub destination: std::path::PathBuf,
}

impl Document {
    /// Build a document from HTML bytes and a destination path.
    pub fn new(html: impl Into<Vec<u8>>, destination: impl Into<std::path::PathBuf>) -> Self {
        Self {
            html: html.into(),
            destination: destination.into(),
        }
    }
}

/// A page's media-box dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

/// The successful outcome of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Where the PDF was written.
    pub url: std::path::PathBuf,
    /// The document's position in the original batch, preserved for
    /// out-of-order completion.
    pub index: usize,
    /// Wall-clock time from acquisition to commit.
    pub duration: Duration,
    /// The pagination mode actually used, after resolving `Automatic`.
    pub chosen_pagination_mode: PaginationMode,
    /// Number of pages in the committed PDF.
    pub page_count: usize,
    /// Media-box dimensions of each page, in order.
    pub page_dimensions: Vec<PageDimensions>,
}

/// A document that failed to render, yielded only in resilient batch mode.
#[derive(Debug, Clone)]
pub struct FailedDocument {
    /// The document that failed.
    pub document: Document,
    /// Its position in the original batch.
    pub index: usize,
    /// Why it failed.
    pub error: RenderError,
    /// How long was spent on it before failing.
    pub duration: Duration,
}

/// Build the margin-CSS `<style>` block for the given margins, in points.
///
/// Cached per (html, css) pair by [`crate::cache::CssInjectionCache`]; this
/// function only produces the CSS bytes to splice, not the splice itself.
pub fn margin_css(margins: &Margins) -> Vec<u8> {
    format!(
        "<style>@media print, screen {{\n  html{{margin:0;padding:0}}\n  body{{margin:0;padding:{}pt {}pt {}pt {}pt;box-sizing:border-box}}\n}}</style>",
        margins.top, margins.right, margins.bottom, margins.left
    )
    .into_bytes()
}

/// Build the appearance-forcing `<style>` block, or an empty buffer for
/// [`Appearance::Auto`] which forces nothing.
pub fn appearance_css(appearance: Appearance) -> Vec<u8> {
    match appearance {
        Appearance::Auto => Vec::new(),
        Appearance::Light => appearance_block("light", "#ffffff", "#000000"),
        Appearance::Dark => appearance_block("dark", "#121212", "#e8e8e8"),
    }
}

fn appearance_block(scheme: &str, background: &str, color: &str) -> Vec<u8> {
    format!(
        "<style>:root {{ color-scheme: {scheme}; }} @media print, screen {{ body {{ background: {background} !important; color: {color} !important; }} }}</style>",
    )
    .into_bytes()
}
