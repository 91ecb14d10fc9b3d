//! Resize policy for loaded images.
//!
//! Cover art that is nearly square is squared off using the shorter requested
//! side. Small non-cover images (screenshots of low-resolution games) are
//! doubled with nearest-neighbour sampling before the smooth resize so pixel
//! edges stay crisp.

use image::imageops::FilterType;
use image::DynamicImage;

/// Aspect ratios in `[NEAR_SQUARE_MIN, NEAR_SQUARE_MAX)` count as square covers.
pub const NEAR_SQUARE_MIN: f64 = 0.85;
pub const NEAR_SQUARE_MAX: f64 = 1.20;

/// Filter used for the final resize.
const SMOOTH_FILTER: FilterType = FilterType::Triangle;

/// What to do with a decoded image before handing it to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Final dimensions
    pub target: (u32, u32),
    /// Double the image with nearest-neighbour sampling first
    pub pre_upscale: bool,
}

/// Width over height, or 1.0 when the ratio is undefined.
pub fn aspect_ratio(size: (u32, u32)) -> f64 {
    if size.1 == 0 {
        return 1.0;
    }
    f64::from(size.0) / f64::from(size.1)
}

/// Decide how to turn an image of `natural` size into the requested one.
///
/// Returns `None` when the image is already at the target size and should be
/// stored untouched. Without a requested size the target is the natural size.
pub fn plan_resize(
    natural: (u32, u32),
    requested: Option<(u32, u32)>,
    is_cover: bool,
    upscale_threshold: u32,
) -> Option<ResizePlan> {
    let mut target = requested.unwrap_or(natural);
    if natural == target {
        return None;
    }

    let pre_upscale = if is_cover {
        let ratio = aspect_ratio(natural);
        if (NEAR_SQUARE_MIN..NEAR_SQUARE_MAX).contains(&ratio) {
            let side = target.0.min(target.1);
            target = (side, side);
        }
        false
    } else {
        natural.0 < upscale_threshold
    };

    Some(ResizePlan {
        target,
        pre_upscale,
    })
}

/// Apply a plan produced by [`plan_resize`].
pub fn apply_plan(image: DynamicImage, plan: &ResizePlan) -> DynamicImage {
    let image = if plan.pre_upscale {
        let width = image.width().saturating_mul(2);
        let height = image.height().saturating_mul(2);
        image.resize_exact(width, height, FilterType::Nearest)
    } else {
        image
    };
    image.resize_exact(plan.target.0, plan.target.1, SMOOTH_FILTER)
}
