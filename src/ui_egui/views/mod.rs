mod palette;
pub mod week_view;

pub(crate) use palette::EventPalette;
