//! Web front end for a document translation service: upload a PPTX, DOCX or
//! PDF, pick a target language, and download the translated file.

pub mod config;
pub mod controller;
pub mod error;
pub mod language;
pub mod routes;
pub mod service;
pub mod state;
pub mod upload;
pub mod view;
