use std::{fmt, mem::size_of};

use bytemuck::{Pod, Zeroable};
use static_assertions::{const_assert, const_assert_eq};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

use crate::color_model::{ColorModelTable, LEVELS};

/// A text vertex: pixel position and the texture coordinate inside the atlas texture array.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    /// u, v, and the slice index.
    pub tex_coords: [f32; 3],
}

impl Vertex {
    pub fn new(position: (f32, f32), uv: (f32, f32), slice: u32) -> Self {
        Self {
            position: [position.0, position.1],
            tex_coords: [uv.0, uv.1, slice as f32],
        }
    }

    pub fn slice(&self) -> u32 {
        self.tex_coords[2] as u32
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        const ATTRS: [VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

        VertexBufferLayout {
            array_stride: size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

/// A column major 3x3 matrix, each column padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Matrix3(pub [[f32; 4]; 3]);

impl Matrix3 {
    /// Maps pixels (origin top left, y down) of a `width` x `height` target to normalized device
    /// coordinates.
    pub fn pixel_to_normal(width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self([
            [2.0 / w, 0.0, 0.0, 0.0],
            [0.0, -2.0 / h, 0.0, 0.0],
            [-1.0, 1.0, 1.0, 0.0],
        ])
    }

    pub fn transform(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let m = &self.0;
        (
            m[0][0] * x + m[1][0] * y + m[2][0],
            m[0][1] * x + m[1][1] * y + m[2][1],
        )
    }
}

/// The 7 table entries, packed into two vec4s for uniform array alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Table(pub [[f32; 4]; 2]);

impl ToPod for ColorModelTable {
    type Pod = Table;

    fn to_pod(&self) -> Self::Pod {
        let mut packed = [[0.0; 4]; 2];
        for (i, value) in self.values().iter().enumerate() {
            packed[i / 4][i % 4] = *value;
        }
        Table(packed)
    }
}

// Two vec4s.
const_assert!(LEVELS <= 8);

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TextUniforms {
    pub pixel_to_normal: Matrix3,
    pub table: Table,
}

// WebGL uniform requirement
const_assert_eq!(size_of::<TextUniforms>() % 16, 0);

pub trait ToPod {
    type Pod;
    fn to_pod(&self) -> Self::Pod;
}

pub trait AsBytes {
    fn as_bytes(&self) -> &[u8];
    fn size<R: TryFrom<usize> + fmt::Debug>() -> R
    where
        R::Error: fmt::Debug;
}

impl<T: Pod> AsBytes for T {
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    fn size<R: TryFrom<usize>>() -> R
    where
        R::Error: fmt::Debug,
    {
        size_of::<Self>()
            .try_into()
            .expect("Failed to convert usize to the required size type")
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn vertex_is_five_floats() {
        assert_eq!(size_of::<Vertex>(), 5 * 4);
        assert_eq!(Vertex::layout().array_stride, 20);
    }

    #[test]
    fn pixel_to_normal_maps_corners() {
        let m = Matrix3::pixel_to_normal(800, 600);
        assert_eq!(m.transform((0.0, 0.0)), (-1.0, 1.0));
        let (x, y) = m.transform((800.0, 600.0));
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, -1.0);
        let (x, y) = m.transform((400.0, 300.0));
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn table_packs_seven_values() {
        let table = ColorModelTable([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            table.to_pod(),
            Table([[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 0.0]])
        );
    }

    #[test]
    fn uniforms_match_the_shader_layout() {
        // mat3x3<f32> (48) + array<vec4<f32>, 2> (32)
        assert_eq!(<TextUniforms as AsBytes>::size::<usize>(), 80);
    }
}
