// SPDX-License-Identifier: GPL-3.0-only

//! Concrete capture sources

pub mod callback;
pub mod images;
pub mod lines;

pub use callback::{CallbackSource, DetectionFeed};
pub use images::ImageSource;
pub use lines::{LineInput, LineSource};
