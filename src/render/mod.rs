pub mod buffers;
pub mod events;
pub mod frame;
pub mod view_transform;
