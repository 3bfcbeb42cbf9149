//! Layout coordinates behind a global scale factor.
//!
//! The renderer works in design-time pixels; display scaling multiplies
//! every numeric leaf of a coordinate structure while preserving its
//! shape, so panel polygons and sizes can be declared once.

/// Structural scaling: numbers multiply, containers scale elementwise.
pub trait Scale {
    fn scale(&self, factor: i32) -> Self;
}

impl Scale for i32 {
    fn scale(&self, factor: i32) -> Self {
        self * factor
    }
}

impl<A: Scale, B: Scale> Scale for (A, B) {
    fn scale(&self, factor: i32) -> Self {
        (self.0.scale(factor), self.1.scale(factor))
    }
}

impl<T: Scale + Clone> Scale for Vec<T> {
    fn scale(&self, factor: i32) -> Self {
        self.iter().map(|item| item.scale(factor)).collect()
    }
}

impl<T: Scale + Copy, const N: usize> Scale for [T; N] {
    fn scale(&self, factor: i32) -> Self {
        self.map(|item| item.scale(factor))
    }
}

/// Design-time layout constants. Getters apply the current scale
/// factor, so callers never see unscaled values.
#[derive(Debug, Clone)]
pub struct Layout {
    scale_factor: i32,
    square_size: i32,
    arrow_thickness: i32,
    moves_panel: [(i32, i32); 4],
    engine_panel: [(i32, i32); 4],
    explorer_panel: [(i32, i32); 4],
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            scale_factor: 1,
            square_size: 68,
            arrow_thickness: 20,
            moves_panel: [(580, 65), (750, 65), (750, 555), (580, 555)],
            engine_panel: [(35, 590), (515, 590), (515, 755), (35, 755)],
            explorer_panel: [(825, 75), (1180, 75), (1180, 610), (825, 610)],
        }
    }
}

impl Layout {
    pub fn set_scale_factor(&mut self, factor: i32) {
        self.scale_factor = factor;
    }

    pub fn square_size(&self) -> i32 {
        self.square_size.scale(self.scale_factor)
    }

    pub fn arrow_thickness(&self) -> i32 {
        self.arrow_thickness.scale(self.scale_factor)
    }

    pub fn moves_panel(&self) -> [(i32, i32); 4] {
        self.moves_panel.scale(self.scale_factor)
    }

    pub fn engine_panel(&self) -> [(i32, i32); 4] {
        self.engine_panel.scale(self.scale_factor)
    }

    pub fn explorer_panel(&self) -> [(i32, i32); 4] {
        self.explorer_panel.scale(self.scale_factor)
    }
}
