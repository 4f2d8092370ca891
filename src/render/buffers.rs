use bytemuck::{Pod, Zeroable};

/// Position of one row in normalized plot space (x, y, z).
pub type Vertex = [f32; 3];
/// RGBA color, 0.0..1.0 per channel.
pub type Rgba = [f32; 4];

/// Floats per vertex in the flat view of a vertex buffer.
const VERTEX_STRIDE: usize = 3;

/// Per-plot drawing parameters handed to a renderer together with the
/// vertex and color buffers. 48 bytes, 16-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub center: [f32; 4],
    pub scale: [f32; 4],
    /// Rotation angle in degrees.
    pub angle: f32,
    pub point_size: f32,
    pub viewport: [f32; 2],
}

/// Read-only strided view of one axis of a vertex buffer.
#[derive(Clone, Copy)]
pub struct AxisView<'a> {
    flat: &'a [f32],
    axis: usize,
}

impl<'a> AxisView<'a> {
    pub fn new(vertices: &'a [Vertex], axis: usize) -> Self {
        assert!(axis < VERTEX_STRIDE, "axis index out of range");
        Self {
            flat: bytemuck::cast_slice(vertices),
            axis,
        }
    }

    pub fn len(&self) -> usize {
        self.flat.len() / VERTEX_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn get(&self, row: usize) -> f32 {
        self.flat[row * VERTEX_STRIDE + self.axis]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = f32> + 'a {
        let flat = self.flat;
        let axis = self.axis;
        (0..flat.len() / VERTEX_STRIDE).map(move |row| flat[row * VERTEX_STRIDE + axis])
    }
}

/// Mutable strided view of one axis of a vertex buffer. Only lives for the
/// duration of a single write.
pub struct AxisViewMut<'a> {
    flat: &'a mut [f32],
    axis: usize,
}

impl<'a> AxisViewMut<'a> {
    pub fn new(vertices: &'a mut [Vertex], axis: usize) -> Self {
        assert!(axis < VERTEX_STRIDE, "axis index out of range");
        Self {
            flat: bytemuck::cast_slice_mut(vertices),
            axis,
        }
    }

    pub fn len(&self) -> usize {
        self.flat.len() / VERTEX_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Copy `values` into this axis, one per vertex.
    pub fn copy_from(&mut self, values: &[f32]) {
        assert_eq!(values.len(), self.len(), "vertex/axis length mismatch");
        for (chunk, &v) in self.flat.chunks_exact_mut(VERTEX_STRIDE).zip(values) {
            chunk[self.axis] = v;
        }
    }

    pub fn fill(&mut self, value: f32) {
        for chunk in self.flat.chunks_exact_mut(VERTEX_STRIDE) {
            chunk[self.axis] = value;
        }
    }
}

pub fn rgba_from_u8(c: [u8; 4]) -> Rgba {
    [
        c[0] as f32 / 255.0,
        c[1] as f32 / 255.0,
        c[2] as f32 / 255.0,
        c[3] as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_views_stride() {
        let mut vertices: Vec<Vertex> = vec![[0.0; 3]; 3];
        AxisViewMut::new(&mut vertices, 1).copy_from(&[1.0, 2.0, 3.0]);
        AxisViewMut::new(&mut vertices, 2).fill(9.0);
        assert_eq!(vertices[1], [0.0, 2.0, 9.0]);

        let view = AxisView::new(&vertices, 1);
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(2), 3.0);
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 48);
    }
}
