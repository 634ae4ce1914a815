use crate::raster::MapLayer;
use crate::readout::ElevationReadout;

/// The layered overlay graphic for one frame, bottom layer first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub layers: Vec<MapLayer>,
    pub readout: Option<ElevationReadout>,
}

impl OverlayFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.readout.is_none()
    }

    /// Layers the drawing leaf actually needs to composite.
    pub fn visible_layers(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter().filter(|l| l.opacity > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::OverlayFrame;
    use crate::raster::MapLayer;
    use foundation::bitmap::Bitmap;

    #[test]
    fn transparent_layers_are_not_visible() {
        let frame = OverlayFrame {
            layers: vec![
                MapLayer::opaque(Bitmap::new(vec![1u8])),
                MapLayer::with_opacity(Bitmap::new(vec![2u8]), 0.0),
            ],
            readout: None,
        };
        assert_eq!(frame.visible_layers().count(), 1);
        assert!(OverlayFrame::empty().is_empty());
    }
}
