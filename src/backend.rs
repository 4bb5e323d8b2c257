use crate::{
    hitshape::{HitShape, PolylineHitShape},
    render::{CurvePathRenderer, PathRenderer},
};

/// Creates the rendering and collision objects a new wire owns.
pub trait WireBackend: Send + Sync {
    fn create_renderer(&self) -> Box<dyn PathRenderer>;
    fn create_hit_shape(&self) -> Box<dyn HitShape>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CurveBackend;

impl WireBackend for CurveBackend {
    fn create_renderer(&self) -> Box<dyn PathRenderer> {
        Box::new(CurvePathRenderer::new())
    }

    fn create_hit_shape(&self) -> Box<dyn HitShape> {
        Box::new(PolylineHitShape::new())
    }
}
