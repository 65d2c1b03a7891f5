//! Built-in fixture models.

pub mod cameo_flat_par_1_rgbw;
pub mod cameo_pixbar_600_pro;
pub mod eurolite_tmh8;
pub mod fun_generation_se_par_quad;
pub mod rgb;
pub mod stairville_af150;
