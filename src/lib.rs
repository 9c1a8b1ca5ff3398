#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::struct_excessive_bools,
    clippy::too_many_lines,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

pub mod app;
pub mod card;
pub mod cli;
pub mod collection;
pub mod debounce;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod grid;
pub mod input;
pub mod loading;
pub mod page;
pub mod plot;
pub mod selection;
pub mod source;
pub mod tui;
