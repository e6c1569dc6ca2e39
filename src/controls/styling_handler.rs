/*
 * Conversions from the platform-neutral `Color` to GDI values.
 */
use crate::types::Color;
use windows::Win32::Foundation::COLORREF;

/// GDI expects 0x00BBGGRR.
pub(crate) fn color_to_colorref(color: Color) -> COLORREF {
    COLORREF((color.r as u32) | ((color.g as u32) << 8) | ((color.b as u32) << 16))
}
