pub mod endpoint_state;
pub mod map_widget;
pub mod sync_controller;
