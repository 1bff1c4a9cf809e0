//! Implementation of the motion mixer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{MixerError, MixerParams, MotionCmd, Wheel, WheelCmd, WheelFractions};
use comms_if::eqpt::mcu::NUM_WHEELS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Omni-wheel mixer.
///
/// The mixer holds no temporal state, it is only a validated copy of the geometry with the wheel
/// direction terms precomputed.
#[derive(Debug, Clone)]
pub struct Mixer {
    params: MixerParams,

    /// `-sin(θ)` of each wheel, the lateral coefficient
    lat_coeffs: [f64; NUM_WHEELS],

    /// `cos(θ)` of each wheel, the forward coefficient
    fwd_coeffs: [f64; NUM_WHEELS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Mixer {
    /// Build a new mixer, rejecting malformed geometry.
    pub fn new(params: MixerParams) -> Result<Self, MixerError> {
        params.validate()?;

        let mut lat_coeffs = [0f64; NUM_WHEELS];
        let mut fwd_coeffs = [0f64; NUM_WHEELS];

        for i in 0..NUM_WHEELS {
            let ang_rad = params.wheel_angles_deg[i].to_radians();
            lat_coeffs[i] = -ang_rad.sin();
            fwd_coeffs[i] = ang_rad.cos();
        }

        Ok(Self {
            params,
            lat_coeffs,
            fwd_coeffs,
        })
    }

    pub fn params(&self) -> &MixerParams {
        &self.params
    }

    /// Mix a body-frame velocity into normalised wheel fractions.
    pub fn mix(&self, cmd: &MotionCmd) -> WheelFractions {
        let mut fracs = [0f64; NUM_WHEELS];

        for i in 0..NUM_WHEELS {
            fracs[i] = self.lat_coeffs[i] * cmd.lateral
                + self.fwd_coeffs[i] * cmd.forward
                + self.params.robot_radius * cmd.angular;
        }

        // Scale everything down together so the direction of travel is kept
        let norm = WheelFractions(fracs).max_abs().max(1.0);
        for f in fracs.iter_mut() {
            *f /= norm;
        }

        WheelFractions(fracs)
    }

    /// Convert wheel fractions into integer demands for the microcontroller.
    ///
    /// Values are truncated toward zero and clamped to the command limit.
    pub fn to_wheel_cmd(&self, fracs: &WheelFractions) -> WheelCmd {
        let limit = self.params.wheel_cmd_limit;
        let mut cmd = [0i32; NUM_WHEELS];

        for wheel in Wheel::ALL.iter() {
            // `as` saturates and maps NaN to zero
            let raw = (fracs.get(*wheel) * limit as f64).trunc() as i32;
            cmd[wheel.index()] = raw.max(-limit).min(limit);
        }

        WheelCmd(cmd)
    }

    /// Mix a body-frame velocity directly into integer wheel demands.
    pub fn mix_to_wheels(&self, cmd: &MotionCmd) -> WheelCmd {
        let wheels = self.to_wheel_cmd(&self.mix(cmd));

        trace!("Mixer: {:?} -> {:?}", cmd, wheels.0);

        wheels
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::Wheel;

    fn mixer() -> Mixer {
        Mixer::new(MixerParams::default()).unwrap()
    }

    #[test]
    fn test_zero_in_zero_out() {
        let m = mixer();
        assert_eq!(m.mix(&MotionCmd::stop()).0, [0.0; NUM_WHEELS]);
        assert!(m.mix_to_wheels(&MotionCmd::stop()).is_zero());
    }

    #[test]
    fn test_fractions_never_exceed_unit() {
        let m = mixer();
        let steps = [-3.0, -1.0, -0.5, 0.0, 0.3, 1.0, 2.5];

        for &lat in steps.iter() {
            for &fwd in steps.iter() {
                for &ang in steps.iter() {
                    let f = m.mix(&MotionCmd::new(lat, fwd, ang));
                    assert!(
                        f.max_abs() <= 1.0 + 1e-12,
                        "{:?} gave {:?}",
                        (lat, fwd, ang),
                        f
                    );
                }
            }
        }
    }

    #[test]
    fn test_linear_below_saturation() {
        let m = mixer();
        let a = MotionCmd::new(0.1, 0.2, 0.3);
        let b = MotionCmd::new(-0.2, 0.1, 0.5);
        let sum = MotionCmd::new(-0.1, 0.3, 0.8);

        let fa = m.mix(&a);
        let fb = m.mix(&b);
        let fsum = m.mix(&sum);

        for i in 0..NUM_WHEELS {
            assert!((fa.0[i] + fb.0[i] - fsum.0[i]).abs() < 1e-12);
        }

        let f2 = m.mix(&MotionCmd::new(0.2, 0.4, 0.6));
        for i in 0..NUM_WHEELS {
            assert!((2.0 * fa.0[i] - f2.0[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_saturation_keeps_ratios() {
        let m = mixer();
        let f = m.mix(&MotionCmd::new(0.0, 2.0, 0.0));

        assert!((f.max_abs() - 1.0).abs() < 1e-12);
        // Pure forward: the front wheels (cos 45°) match the back wheels (cos 135°) in magnitude
        assert!((f.get(Wheel::FrontLeft) + f.get(Wheel::BackLeft)).abs() < 1e-12);
        assert!((f.get(Wheel::FrontLeft) - f.get(Wheel::FrontRight)).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_cmd_truncates_and_clamps() {
        let m = mixer();

        let cmd = m.to_wheel_cmd(&WheelFractions([0.5, -0.5, 0.999, 1.5]));
        assert_eq!(cmd.0, [127, -127, 254, 255]);

        let cmd = m.to_wheel_cmd(&WheelFractions([f64::NAN, -2.0, 0.0, 0.001]));
        assert_eq!(cmd.0, [0, -255, 0, 0]);
    }

    #[test]
    fn test_pure_rotation_drives_all_wheels_equally() {
        let m = mixer();
        let f = m.mix(&MotionCmd::rotate(1.0));
        for w in Wheel::ALL.iter() {
            assert!((f.get(*w) - 0.12).abs() < 1e-12);
        }
    }

    #[test]
    fn test_malformed_geometry_rejected() {
        let mut p = MixerParams::default();
        p.wheel_angles_deg[2] = f64::NAN;
        assert!(matches!(
            Mixer::new(p),
            Err(MixerError::NonFiniteAngle(Wheel::BackLeft))
        ));

        let mut p = MixerParams::default();
        p.wheel_angles_deg[3] = 45.0;
        assert!(matches!(
            Mixer::new(p),
            Err(MixerError::DuplicateAngle(Wheel::FrontLeft, Wheel::BackRight))
        ));

        let mut p = MixerParams::default();
        p.robot_radius = 0.0;
        assert!(matches!(Mixer::new(p), Err(MixerError::InvalidRadius(_))));

        let mut p = MixerParams::default();
        p.wheel_cmd_limit = 0;
        assert!(matches!(Mixer::new(p), Err(MixerError::InvalidLimit(0))));
    }
}
