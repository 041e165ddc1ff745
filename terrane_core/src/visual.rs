// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color, blend, and visibility state with ancestor combination rules.
//!
//! Each node carries *local* visual state set by the caller; the update pass
//! produces the ancestor-combined equivalents by folding parents' combined
//! state into the node's local state, stopping at the owning render-group
//! boundary:
//!
//! - [`Tint`] — channel-wise color multiply, alpha multiply.
//! - [`BlendMode`] — [`Inherit`](BlendMode::Inherit) resolves to the parent's
//!   resolved mode ([`SourceOver`](BlendMode::SourceOver) at the boundary).
//! - [`NodeFlags`] — per-bit logical AND.
//!
//! [`ChangeFlags`] records *which* of these categories changed since the last
//! update, so backends apply only the state updates that are actually stale.

use bitflags::bitflags;

/// Local color tint and alpha of a node.
///
/// `rgb` is `0xRRGGBB`; white (`0xFFFFFF`) means "no tint". Alpha is in
/// `0.0..=1.0` and multiplies down the tree independently of the color
/// channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tint {
    /// Packed `0xRRGGBB` color.
    pub rgb: u32,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
}

impl Tint {
    /// No tint, fully opaque.
    pub const WHITE: Self = Self {
        rgb: 0xFF_FFFF,
        alpha: 1.0,
    };

    /// Folds a parent's combined tint into this one.
    ///
    /// Colors multiply channel-wise (with a fast path when either side is
    /// white); alphas multiply.
    #[must_use]
    pub fn combine(self, parent: Self) -> Self {
        let rgb = if self.rgb == 0xFF_FFFF {
            parent.rgb
        } else if parent.rgb == 0xFF_FFFF {
            self.rgb
        } else {
            let r = (((self.rgb >> 16) & 0xFF) * ((parent.rgb >> 16) & 0xFF)) / 255;
            let g = (((self.rgb >> 8) & 0xFF) * ((parent.rgb >> 8) & 0xFF)) / 255;
            let b = ((self.rgb & 0xFF) * (parent.rgb & 0xFF)) / 255;
            (r << 16) | (g << 8) | b
        };
        Self {
            rgb,
            alpha: self.alpha * parent.alpha,
        }
    }

    /// Packs color and alpha into a single `u32` in reversed byte order
    /// (`alpha << 24 | blue << 16 | green << 8 | red`), the layout consumed
    /// directly by little-endian RGBA backends.
    #[must_use]
    pub fn packed(self) -> u32 {
        let a = (self.alpha.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        let r = (self.rgb >> 16) & 0xFF;
        let g = (self.rgb >> 8) & 0xFF;
        let b = self.rgb & 0xFF;
        (a << 24) | (b << 16) | (g << 8) | r
    }
}

impl Default for Tint {
    #[inline]
    fn default() -> Self {
        Self::WHITE
    }
}

/// Blend mode for compositing a node.
///
/// [`Inherit`](Self::Inherit) is a sentinel meaning "use the parent's
/// resolved mode"; the update pass never leaves it in a node's combined
/// state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Use the parent's resolved blend mode.
    #[default]
    Inherit,
    /// Standard source-over alpha compositing.
    SourceOver,
    /// Additive blend.
    Add,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
}

impl BlendMode {
    /// Resolves this mode against a parent's already-resolved mode.
    #[inline]
    #[must_use]
    pub fn resolve(self, parent: Self) -> Self {
        match self {
            Self::Inherit => parent,
            concrete => concrete,
        }
    }
}

/// Per-node visibility booleans.
///
/// `visible` suspends transform recomputation for the node's subtree when
/// false; `renderable` suspends drawing only, transforms still update. A node
/// is drawable only when both bits survive combination along the ancestor
/// chain up to the render group and the combined alpha is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Whether the node and its subtree participate in updates and drawing.
    pub visible: bool,
    /// Whether the node itself is drawn.
    pub renderable: bool,
}

impl NodeFlags {
    /// Folds a parent's combined flags into this one (per-bit AND).
    #[inline]
    #[must_use]
    pub fn combine(self, parent: Self) -> Self {
        Self {
            visible: self.visible && parent.visible,
            renderable: self.renderable && parent.renderable,
        }
    }
}

impl Default for NodeFlags {
    #[inline]
    fn default() -> Self {
        Self {
            visible: true,
            renderable: true,
        }
    }
}

bitflags! {
    /// Which categories of a node's state changed since the last update.
    ///
    /// OR-accumulated by property setters independently of the change
    /// latches, cleared by the update pass. Backends use these to apply only
    /// the state updates that actually changed.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChangeFlags: u8 {
        /// Tint or alpha changed.
        const COLOR = 1 << 0;
        /// Blend mode changed.
        const BLEND = 1 << 1;
        /// A visibility bit changed.
        const VISIBLE = 1 << 2;
        /// A transform input changed.
        const TRANSFORM = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_combine_fast_paths() {
        let red = Tint {
            rgb: 0xFF_0000,
            alpha: 1.0,
        };
        assert_eq!(red.combine(Tint::WHITE).rgb, 0xFF_0000);
        assert_eq!(Tint::WHITE.combine(red).rgb, 0xFF_0000);
    }

    #[test]
    fn combine_multiplies_channels_and_alpha() {
        let a = Tint {
            rgb: 0x80_4020,
            alpha: 0.5,
        };
        let b = Tint {
            rgb: 0x80_8080,
            alpha: 0.5,
        };
        let c = a.combine(b);
        assert_eq!(c.rgb, 0x40_2010);
        assert!((c.alpha - 0.25).abs() < 1e-6);
    }

    #[test]
    fn packed_is_reversed_byte_order() {
        let t = Tint {
            rgb: 0x11_2233,
            alpha: 1.0,
        };
        assert_eq!(t.packed(), 0xFF_33_22_11);
    }

    #[test]
    fn packed_scales_alpha() {
        let t = Tint {
            rgb: 0xFF_FFFF,
            alpha: 0.0,
        };
        assert_eq!(t.packed() >> 24, 0);
    }

    #[test]
    fn inherit_resolves_to_parent() {
        assert_eq!(
            BlendMode::Inherit.resolve(BlendMode::Multiply),
            BlendMode::Multiply
        );
        assert_eq!(
            BlendMode::Screen.resolve(BlendMode::Multiply),
            BlendMode::Screen
        );
    }

    #[test]
    fn flags_combine_is_per_bit_and() {
        let local = NodeFlags {
            visible: true,
            renderable: false,
        };
        let parent = NodeFlags {
            visible: false,
            renderable: true,
        };
        let combined = local.combine(parent);
        assert!(!combined.visible);
        assert!(!combined.renderable);
    }

    #[test]
    fn change_flags_accumulate() {
        let mut flags = ChangeFlags::empty();
        flags |= ChangeFlags::COLOR;
        flags |= ChangeFlags::VISIBLE;
        assert!(flags.contains(ChangeFlags::COLOR | ChangeFlags::VISIBLE));
        assert!(!flags.contains(ChangeFlags::BLEND));
    }
}
