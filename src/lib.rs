//! # Text Organizer
//!
//! Structure free-form notes with a generative-language API and file them
//! under topics.
//!
//! A submitted text is sent to the model twice: once to name its topic
//! (unless the caller supplies one) and once to rewrite it as dated,
//! numbered HTML. The original and structured texts are stored in SQLite
//! under a topic that is created on first use.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐
//! │   HTTP   │──▶│  process  │──▶│ repository │──▶ SQLite
//! │   CLI    │   │           │   └────────────┘
//! └──────────┘   │           │   ┌────────────┐
//!                │           │──▶│     ai     │──▶ Gemini
//!                └───────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! organizer init                           # create database
//! organizer process --file notes.txt       # structure one text
//! organizer topics                         # list topics
//! organizer serve                          # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Topic and processed-text types |
//! | [`error`] | Error taxonomy and HTTP status mapping |
//! | [`ai`] | Remote model client, prompts and answer cleanup |
//! | [`repository`] | Topic and text persistence |
//! | [`process`] | The processing workflow |
//! | [`server`] | HTTP API |
//! | [`topics`] | CLI listings |
//! | [`stats`] | Database statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod migrate;
pub mod models;
pub mod process;
pub mod repository;
pub mod server;
pub mod stats;
pub mod topics;
