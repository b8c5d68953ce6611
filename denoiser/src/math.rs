//! Math type aliases and camera helpers.
//!
//! All matrices follow the nalgebra convention: column vectors, stored
//! column-major, which is also the order they are packed into constants.

pub use nalgebra;

// ===== Types =====

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

// ===== Projection helpers =====

/// Build a right-handed perspective projection with depth range [0, 1].
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Build a right-handed orthographic projection with depth range [0, 1].
pub fn orthographic_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;
    #[rustfmt::skip]
    let result = Mat4::new(
        2.0 / rml, 0.0,       0.0,         -(right + left) / rml,
        0.0,       2.0 / tmb, 0.0,         -(top + bottom) / tmb,
        0.0,       0.0,       -1.0 / fmn,  -near / fmn,
        0.0,       0.0,       0.0,          1.0,
    );
    result
}

/// Right-handed look-at view matrix.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::look_at_rh(&eye_point, &target_point, up).to_homogeneous()
}

/// Check if a projection matrix is orthographic.
pub fn is_orthographic(view_to_clip: &Mat4) -> bool {
    view_to_clip[(3, 2)] == 0.0
}

/// Reconstruction parameters of the view frustum.
///
/// Returns `(x0, y0, width, height)` such that the view-space position of a
/// pixel at normalized coordinates `uv` (origin top-left) is
/// `(x0 + uv.x * width, y0 + uv.y * height)` scaled by view depth, or not
/// scaled at all for orthographic projections.
pub fn frustum_from_projection(view_to_clip: &Mat4) -> Vec4 {
    let p00 = view_to_clip[(0, 0)];
    let p11 = view_to_clip[(1, 1)];
    let (ox, oy) = if is_orthographic(view_to_clip) {
        (-view_to_clip[(0, 3)], -view_to_clip[(1, 3)])
    } else {
        (view_to_clip[(0, 2)], view_to_clip[(1, 2)])
    };

    let left = (-1.0 + ox) / p00;
    let right = (1.0 + ox) / p00;
    let top = (1.0 + oy) / p11;
    let bottom = (-1.0 + oy) / p11;

    Vec4::new(left, top, right - left, bottom - top)
}

/// World-space camera position of a world-to-view matrix.
///
/// Returns `None` when the matrix is not invertible.
pub fn camera_position(world_to_view: &Mat4) -> Option<Vec3> {
    let view_to_world = world_to_view.try_inverse()?;
    Some(Vec3::new(
        view_to_world[(0, 3)],
        view_to_world[(1, 3)],
        view_to_world[(2, 3)],
    ))
}

// ===== Scalar helpers =====

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 2D rotation packed as `(cos, sin, -sin, cos)`.
pub fn rotator(angle: f32) -> Vec4 {
    let (s, c) = angle.sin_cos();
    Vec4::new(c, s, -s, c)
}

/// Deterministic angle in `[0, 2π)` for a frame index and a stream.
///
/// Uses a Weyl sequence so consecutive frames are well spread and the result
/// depends only on its inputs.
pub fn frame_angle(frame_index: u32, stream: u32) -> f32 {
    let hash = frame_index
        .wrapping_mul(0x9E37_79B9)
        .wrapping_add(stream.wrapping_mul(0x5555_5555));
    let unit = (hash >> 8) as f32 / (1u32 << 24) as f32;
    unit * std::f32::consts::TAU
}
