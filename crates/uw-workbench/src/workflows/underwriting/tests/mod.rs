mod common;
mod edits;
mod lifecycle;
mod workbench;
