//! Drag-and-drop file upload demo: an HTTP upload service and the widget
//! that talks to it.
//!
//! The two halves share nothing at runtime. [`service`] is the server
//! (`dropzone` binary), [`widget`] and [`uploader`] make up the client
//! (`widget-demo` binary), and [`models`] holds the JSON wire types both
//! sides agree on.

pub mod models;
pub mod service;
pub mod uploader;
pub mod widget;
