pub mod colors;
pub mod plot_set;
pub mod plot_view;
pub mod selection;
pub mod theme;
