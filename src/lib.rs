//! OxideViews: linked, brushable scatterplots over a shared numeric table.
//!
//! The table lives in a [`data::column_store::ColumnStore`]; a
//! [`state::plot_set::PlotSet`] owns every plot together with the shared
//! selection and rank cache. The egui front end lives in [`app`] and [`ui`].

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod render;
pub mod state;
pub mod ui;
