//! Price chart ownership.
//!
//! [`ChartManager`] owns exactly one renderer bound to one drawing surface.
//! Structural changes (surface height, theme) rebuild the renderer; data-only
//! changes update it in place. Width changes are applied as a resize.

mod price;

pub use price::{PriceChart, PriceChartFactory};
pub(crate) use price::format_day_number;

use crate::domain::PricePoint;
use crate::theme::Theme;

/// Identifies one renderer construction. A new id means a rebuild happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

/// Size and look of the surface the renderer draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub width: u16,
    pub height: u16,
    pub theme: Theme,
}

impl Surface {
    pub fn new(width: u16, height: u16, theme: Theme) -> Self {
        Self { width, height, theme }
    }

    fn is_structurally_equal(&self, other: &Surface) -> bool {
        self.height == other.height && self.theme == other.theme
    }
}

/// A stateful chart widget.
///
/// Dropping the renderer releases it.
pub trait ChartRenderer {
    /// Replace the plotted series.
    fn set_data(&mut self, prices: &[PricePoint]);

    /// Fit the time axis to the current data.
    fn fit_content(&mut self);

    fn resize_width(&mut self, width: u16);
}

pub trait RendererFactory {
    type Renderer: ChartRenderer;

    fn create(&mut self, surface: Surface) -> Self::Renderer;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartState {
    Uninitialized,
    Ready,
    Disposed,
}

struct Mounted<R> {
    id: InstanceId,
    surface: Surface,
    renderer: R,
}

enum Slot<R> {
    Uninitialized,
    Ready(Mounted<R>),
    Disposed,
}

pub struct ChartManager<F: RendererFactory> {
    factory: F,
    slot: Slot<F::Renderer>,
    data: Vec<PricePoint>,
    next_id: u64,
}

impl<F: RendererFactory> ChartManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            slot: Slot::Uninitialized,
            data: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> ChartState {
        match self.slot {
            Slot::Uninitialized => ChartState::Uninitialized,
            Slot::Ready(_) => ChartState::Ready,
            Slot::Disposed => ChartState::Disposed,
        }
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        match &self.slot {
            Slot::Ready(m) => Some(m.id),
            _ => None,
        }
    }

    pub fn renderer(&self) -> Option<&F::Renderer> {
        match &self.slot {
            Slot::Ready(m) => Some(&m.renderer),
            _ => None,
        }
    }

    pub fn surface(&self) -> Option<Surface> {
        match &self.slot {
            Slot::Ready(m) => Some(m.surface),
            _ => None,
        }
    }

    pub fn data(&self) -> &[PricePoint] {
        &self.data
    }

    /// Bind to a surface. Rebuilds when height or theme differ from the
    /// mounted surface, resizes when only the width differs, and otherwise
    /// leaves the renderer alone.
    ///
    /// Returns `true` when a new renderer was constructed.
    pub fn mount(&mut self, surface: Surface) -> bool {
        if let Slot::Ready(m) = &mut self.slot {
            if m.surface.is_structurally_equal(&surface) {
                if m.surface.width != surface.width {
                    m.surface.width = surface.width;
                    m.renderer.resize_width(surface.width);
                }
                return false;
            }
        }

        self.dispose();
        let mut renderer = self.factory.create(surface);
        if !self.data.is_empty() {
            renderer.set_data(&self.data);
        }
        renderer.fit_content();

        self.next_id += 1;
        let id = InstanceId(self.next_id);
        tracing::debug!(
            instance = id.0,
            width = surface.width,
            height = surface.height,
            theme = %surface.theme,
            "chart renderer created"
        );
        self.slot = Slot::Ready(Mounted { id, surface, renderer });
        true
    }

    /// Replace the series. Applied in place when a renderer is mounted;
    /// otherwise kept for the next mount.
    pub fn set_data(&mut self, prices: &[PricePoint]) {
        self.data.clear();
        self.data.extend_from_slice(prices);
        if let Slot::Ready(m) = &mut self.slot {
            m.renderer.set_data(&self.data);
            m.renderer.fit_content();
        }
    }

    /// Container width changed. Ignored unless mounted.
    pub fn on_resize(&mut self, width: u16) {
        if let Slot::Ready(m) = &mut self.slot {
            if m.surface.width != width {
                m.surface.width = width;
                m.renderer.resize_width(width);
            }
        }
    }

    /// Release the renderer. Later resizes and data updates do not reach it.
    pub fn unmount(&mut self) {
        self.dispose();
    }

    fn dispose(&mut self) {
        if let Slot::Ready(m) = std::mem::replace(&mut self.slot, Slot::Disposed) {
            tracing::debug!(instance = m.id.0, "chart renderer disposed");
            drop(m.renderer);
        }
    }
}
