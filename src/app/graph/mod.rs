mod build;
mod chrome;
mod interaction;
mod view;

pub(super) use build::{CardLine, layer_lines};
pub(super) use chrome::Backdrop;
