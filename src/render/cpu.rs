use crate::foundation::core::{BezPath, Viewport};
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::composite::screen_in_place;
use crate::render::surface::DrawSurface;

/// CPU drawing surface: `vello_cpu` rasterizes each shape into a scratch layer which is then
/// screen-blended into the accumulated frame in software.
pub struct CpuCanvas {
    viewport: Viewport,
    width_u16: u16,
    height_u16: u16,
    ctx: Option<vello_cpu::RenderContext>,
    layer: vello_cpu::Pixmap,
    frame: Vec<u8>,
}

impl CpuCanvas {
    pub fn new(viewport: Viewport) -> SpectroResult<Self> {
        let (w, h) = surface_dims(viewport)?;
        Ok(Self {
            viewport,
            width_u16: w,
            height_u16: h,
            ctx: None,
            layer: vello_cpu::Pixmap::new(w, h),
            frame: vec![0u8; viewport.pixel_len()],
        })
    }

    fn with_ctx_mut<R>(&mut self, f: impl FnOnce(&mut vello_cpu::RenderContext) -> R) -> R {
        let (w, h) = (self.width_u16, self.height_u16);
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let out = f(&mut ctx);
        self.ctx = Some(ctx);
        out
    }
}

impl DrawSurface for CpuCanvas {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> SpectroResult<()> {
        if viewport == self.viewport {
            return Ok(());
        }
        let (w, h) = surface_dims(viewport)?;
        self.viewport = viewport;
        self.width_u16 = w;
        self.height_u16 = h;
        self.layer = vello_cpu::Pixmap::new(w, h);
        self.frame = vec![0u8; viewport.pixel_len()];
        self.ctx = None;
        Ok(())
    }

    fn clear(&mut self) -> SpectroResult<()> {
        self.frame.fill(0);
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath, rgba: [u8; 4]) -> SpectroResult<()> {
        let cpu_path = bezpath_to_cpu(path);
        let [r, g, b, a] = rgba;

        let mut layer = std::mem::replace(&mut self.layer, vello_cpu::Pixmap::new(1, 1));
        layer.data_as_u8_slice_mut().fill(0);
        self.with_ctx_mut(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_path(&cpu_path);
            ctx.flush();
            ctx.render_to_pixmap(&mut layer);
        });

        let result = screen_in_place(&mut self.frame, layer.data_as_u8_slice());
        self.layer = layer;
        result
    }

    fn pixels(&self) -> &[u8] {
        &self.frame
    }
}

fn surface_dims(viewport: Viewport) -> SpectroResult<(u16, u16)> {
    let w: u16 = viewport
        .width
        .try_into()
        .map_err(|_| SpectroError::render("surface width exceeds u16"))?;
    let h: u16 = viewport
        .height
        .try_into()
        .map_err(|_| SpectroError::render("surface height exceeds u16"))?;
    Ok((w, h))
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
