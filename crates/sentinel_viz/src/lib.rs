//! # Sentinel Viz - Explained Graph Explorer
//!
//! Web server, HTTP client and CLI around the [`sentinel_story`] transform.
//!
//! ## Overview
//!
//! The explainer pipeline leaves two JSON documents per sequence on disk:
//! the provenance graph of the sequence's centre window and the model's
//! explanation. This crate serves them, derives stories and render-ready
//! scenes from them, and ships a single-page UI that draws the graph and
//! the narrative side by side.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Server (port 8000)                                  │
//! │  ├── GET /status                 → health + sequences     │
//! │  ├── GET /graph/{id}             → graph document         │
//! │  ├── GET /explain/{id}           → explanation document   │
//! │  ├── GET /story/{id}             → incident report        │
//! │  ├── GET /api/story/{id}         → narrative story        │
//! │  ├── GET /api/scene/{id}         → layout + colours       │
//! │  ├── GET /api/scene/{id}/node    → node inspector         │
//! │  └── GET /                       → web UI                 │
//! └──────────────────────────────────────────────────────────┘
//!            ▲                                   ▲
//!   ArtifactStore (files)              BackendClient (reqwest)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sentinel_viz::{ArtifactStore, VizConfig, VizServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = VizServer::new(VizConfig::default(), ArtifactStore::default());
//!     server.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! Fetching a story from a running backend:
//!
//! ```rust,ignore
//! use sentinel_story::StoryConfig;
//! use sentinel_viz::{BackendClient, ClientConfig};
//!
//! let client = BackendClient::new(ClientConfig::default())?;
//! let story = client.load_story(0, &StoryConfig::default()).await?;
//! for line in &story.timeline {
//!     println!("{}", line);
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod scene;
pub mod server;
pub mod store;

pub use api::{create_router, ApiState};
pub use client::{BackendClient, BackendStatus, ClientConfig, SequenceView};
pub use error::{Error, Result};
pub use scene::{NodeDetails, Scene, SceneConfig, SceneLink, SceneNode};
pub use server::{VizConfig, VizServer};
pub use store::ArtifactStore;

/// Version information from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
