// Concentrated-liquidity swap math for direct quoting without the Quoter.
//
// Trade simulation runs over a synthetic tick window centred on the pool's
// current tick: a fixed number of spacings on each side, clamped to the
// valid tick range, with uniform placeholder liquidity at every boundary
// (zero net liquidity, so in-range liquidity is constant across the walk).
// This is an approximation of the real tick bitmap and will misprice pools
// with uneven liquidity distribution.

use ethers::core::types::U512;
use ethers::types::U256;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Tick bounds shared with the deployed pool contracts.
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Spacings kept on each side of the current tick in the synthetic window.
pub const SURROUNDING_SPACINGS: i32 = 300;

/// 2^96. Limbs are 64-bit little-endian, so bit 96 sits in the second limb.
pub const Q96: U256 = U256([0, 4_294_967_296, 0, 0]);

const FEE_DENOMINATOR: u32 = 1_000_000;

// TickMath magic factors: sqrt(1.0001)^-(2^i) in Q128, for bit i of |tick|.
static TICK_FACTORS: Lazy<[U256; 20]> = Lazy::new(|| {
    [
        "fffcb933bd6fad37aa2d162d1a594001",
        "fff97272373d413259a46990580e213a",
        "fff2e50f5f656932ef12357cf3c7fdcc",
        "ffe5caca7e10e4e61c3624eaa0941cd0",
        "ffcb9843d60f6159c9db58835c926644",
        "ff973b41fa98c081472e6896dfb254c0",
        "ff2ea16466c96a3843ec78b326b52861",
        "fe5dee046a99a2a811c461f1969c3053",
        "fcbe86c7900a88aedcffc83b479aa3a4",
        "f987a7253ac413176f2b074cf7815e54",
        "f3392b0822b70005940c7a398e4b70f3",
        "e7159475a2c29b7443b29c7fa6e889d9",
        "d097f3bdfd2022b8845ad8f792aa5825",
        "a9f746462d870fdf8a65dc1f90e061e5",
        "70d869a156d2a1b890bb3df62baf32f7",
        "31be135f97d08fd981231505542fcfa6",
        "9aa508b5b7a84e1c677de54f3e99bc9",
        "5d6af8dedb81196699c329225ee604",
        "2216e584f5fa1ea926041bedfe98",
        "48a170391f7dc42444e8fa2",
    ]
    .map(|hex| U256::from_str_radix(hex, 16).expect("static factor"))
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwapMathError {
    #[error("zero liquidity")]
    ZeroLiquidity,
    #[error("zero trade amount")]
    ZeroAmount,
    #[error("liquidity window exhausted before the trade filled")]
    WindowExhausted,
}

/// floor(a * b / c) with 512-bit intermediate precision.
fn mul_div(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::zero();
    }
    (a.full_mul(b) / U512::from(c))
        .try_into()
        .unwrap_or(U256::max_value())
}

/// ceil(a * b / c) with 512-bit intermediate precision.
fn mul_div_rounding_up(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::zero();
    }
    let product = a.full_mul(b);
    let c512 = U512::from(c);
    let quotient = product / c512;
    let rounded = if product % c512 == U512::zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    rounded.try_into().unwrap_or(U256::max_value())
}

/// sqrt(1.0001^tick) * 2^96 (TickMath.getSqrtRatioAtTick). Out-of-range
/// ticks are clamped to the bounds.
pub fn sqrt_ratio_at_tick(tick: i32) -> U256 {
    let tick = tick.clamp(MIN_TICK, MAX_TICK);
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 != 0 {
        TICK_FACTORS[0]
    } else {
        U256::one() << 128
    };
    for (bit, factor) in TICK_FACTORS.iter().enumerate().skip(1) {
        if abs_tick & (1 << bit) != 0 {
            ratio = (ratio.full_mul(*factor) >> 128)
                .try_into()
                .unwrap_or(U256::max_value());
        }
    }

    if tick > 0 {
        ratio = U256::max_value() / ratio;
    }

    // Q128 -> Q96, rounding up so round-tripping through tick math is stable.
    let truncated = ratio >> 32;
    if ratio % (U256::one() << 32) == U256::zero() {
        truncated
    } else {
        truncated + U256::one()
    }
}

/// Rounds a tick to the nearest multiple of `spacing`, clamped so the result
/// stays inside the usable tick range.
pub fn nearest_usable_tick(tick: i32, spacing: i32) -> i32 {
    debug_assert!(spacing > 0);
    let rounded = (tick as f64 / spacing as f64).round() as i32 * spacing;
    // largest and smallest spacing multiples inside the tick range;
    // integer division truncates toward zero on both signs
    let max_usable = (MAX_TICK / spacing) * spacing;
    let min_usable = (MIN_TICK / spacing) * spacing;
    rounded.clamp(min_usable, max_usable)
}

/// Synthetic tick window: uniform placeholder liquidity at every spacing
/// boundary between `min_tick` and `max_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickWindow {
    pub min_tick: i32,
    pub max_tick: i32,
    pub spacing: i32,
}

impl TickWindow {
    /// Builds the fixed-width window around the current tick.
    pub fn around(current_tick: i32, spacing: i32) -> Self {
        let min_tick = nearest_usable_tick(
            current_tick.saturating_sub(SURROUNDING_SPACINGS.saturating_mul(spacing)),
            spacing,
        );
        let max_tick = nearest_usable_tick(
            current_tick.saturating_add(SURROUNDING_SPACINGS.saturating_mul(spacing)),
            spacing,
        );
        Self {
            min_tick,
            max_tick,
            spacing,
        }
    }

    fn clamp_tick(&self, tick: i32) -> i32 {
        tick.clamp(self.min_tick, self.max_tick)
    }
}

struct SwapStep {
    amount_in: U256,
    amount_out: U256,
    fee_amount: U256,
    sqrt_price_next: U256,
}

fn amount0_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> U256 {
    let (lower, upper) = if sqrt_a > sqrt_b {
        (sqrt_b, sqrt_a)
    } else {
        (sqrt_a, sqrt_b)
    };
    if lower.is_zero() {
        return U256::zero();
    }
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;
    if round_up {
        mul_div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper), U256::one(), lower)
    } else {
        mul_div(numerator1, numerator2, upper) / lower
    }
}

fn amount1_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> U256 {
    let (lower, upper) = if sqrt_a > sqrt_b {
        (sqrt_b, sqrt_a)
    } else {
        (sqrt_a, sqrt_b)
    };
    let diff = upper - lower;
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), diff, Q96)
    } else {
        mul_div(U256::from(liquidity), diff, Q96)
    }
}

fn next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> U256 {
    if amount_in.is_zero() {
        return sqrt_price;
    }
    let liquidity = U256::from(liquidity);
    if zero_for_one {
        // token0 in: price moves down
        let numerator1 = U512::from(liquidity) << 96;
        let denominator = numerator1 + amount_in.full_mul(sqrt_price);
        ((numerator1 * U512::from(sqrt_price)) / denominator)
            .try_into()
            .unwrap_or(U256::max_value())
    } else {
        // token1 in: price moves up
        sqrt_price.saturating_add(mul_div(amount_in, Q96, liquidity))
    }
}

fn next_sqrt_price_from_output(
    sqrt_price: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Option<U256> {
    if amount_out.is_zero() {
        return Some(sqrt_price);
    }
    let liquidity = U256::from(liquidity);
    if zero_for_one {
        // token1 out: price moves down
        let quotient = mul_div_rounding_up(amount_out, Q96, liquidity);
        sqrt_price.checked_sub(quotient)
    } else {
        // token0 out: price moves up
        let numerator1 = U512::from(liquidity) << 96;
        let product = amount_out.full_mul(sqrt_price);
        if product >= numerator1 {
            return None; // more token0 requested than the range can supply
        }
        let denominator = numerator1 - product;
        ((numerator1 * U512::from(sqrt_price)) / denominator)
            .try_into()
            .ok()
    }
}

/// One swap step bounded by a target sqrt price (SwapMath.computeSwapStep).
fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_pips: u32,
    exact_in: bool,
) -> SwapStep {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let fee_complement = U256::from(FEE_DENOMINATOR - fee_pips);

    if exact_in {
        let amount_remaining_less_fee =
            mul_div(amount_remaining, fee_complement, U256::from(FEE_DENOMINATOR));
        let amount_in_to_target = if zero_for_one {
            amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)
        } else {
            amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)
        };

        let (sqrt_price_next, amount_in) = if amount_remaining_less_fee >= amount_in_to_target {
            (sqrt_price_target, amount_in_to_target)
        } else {
            let next = next_sqrt_price_from_input(
                sqrt_price_current,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            );
            let used = if zero_for_one {
                amount0_delta(next, sqrt_price_current, liquidity, true)
            } else {
                amount1_delta(sqrt_price_current, next, liquidity, true)
            };
            (next, used)
        };

        let amount_out = if zero_for_one {
            amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, false)
        } else {
            amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, false)
        };

        let fee_amount = if sqrt_price_next != sqrt_price_target {
            // the step consumed the whole remaining amount
            amount_remaining.saturating_sub(amount_in)
        } else {
            mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)
        };

        SwapStep {
            amount_in,
            amount_out,
            fee_amount,
            sqrt_price_next,
        }
    } else {
        let amount_out_to_target = if zero_for_one {
            amount1_delta(sqrt_price_target, sqrt_price_current, liquidity, false)
        } else {
            amount0_delta(sqrt_price_current, sqrt_price_target, liquidity, false)
        };

        let (sqrt_price_next, amount_out) = if amount_remaining >= amount_out_to_target {
            (sqrt_price_target, amount_out_to_target)
        } else {
            let next = next_sqrt_price_from_output(
                sqrt_price_current,
                liquidity,
                amount_remaining,
                zero_for_one,
            )
            .unwrap_or(sqrt_price_target);
            (next, amount_remaining)
        };

        let amount_in = if zero_for_one {
            amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, true)
        } else {
            amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, true)
        };
        let fee_amount = mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement);

        SwapStep {
            amount_in,
            amount_out,
            fee_amount,
            sqrt_price_next,
        }
    }
}

/// Outcome of a simulated swap over the synthetic window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSimulation {
    /// Total input consumed, fees included.
    pub amount_in: U256,
    /// Total output produced.
    pub amount_out: U256,
    pub sqrt_price_after: U256,
}

/// Simulates a swap against constant liquidity, stepping one spacing
/// boundary at a time until the trade fills or the window is exhausted.
///
/// `amount` is the input amount when `exact_in`, the desired output amount
/// otherwise. Liquidity never changes across boundaries because the window's
/// placeholder ticks carry zero net liquidity.
#[allow(clippy::too_many_arguments)]
pub fn simulate_swap(
    sqrt_price_x96: U256,
    current_tick: i32,
    liquidity: u128,
    window: TickWindow,
    amount: U256,
    exact_in: bool,
    zero_for_one: bool,
    fee_pips: u32,
) -> Result<SwapSimulation, SwapMathError> {
    if liquidity == 0 {
        return Err(SwapMathError::ZeroLiquidity);
    }
    if amount.is_zero() {
        return Err(SwapMathError::ZeroAmount);
    }

    let mut sqrt_price = sqrt_price_x96;
    let mut walker_tick = window.clamp_tick(current_tick);
    let mut amount_remaining = amount;
    let mut total_in = U256::zero();
    let mut total_out = U256::zero();

    // One iteration per boundary plus slack; constant liquidity means the
    // walk cannot revisit a boundary.
    let max_steps = (2 * SURROUNDING_SPACINGS + 2) as usize;

    for _ in 0..max_steps {
        if amount_remaining.is_zero() {
            break;
        }

        let next_tick = if zero_for_one {
            window.clamp_tick(walker_tick - window.spacing)
        } else {
            window.clamp_tick(walker_tick + window.spacing)
        };
        let at_edge = next_tick == walker_tick;
        if at_edge {
            return Err(SwapMathError::WindowExhausted);
        }

        let sqrt_price_target = sqrt_ratio_at_tick(next_tick);
        let step = compute_swap_step(
            sqrt_price,
            sqrt_price_target,
            liquidity,
            amount_remaining,
            fee_pips,
            exact_in,
        );

        if exact_in {
            let consumed = step.amount_in.saturating_add(step.fee_amount);
            amount_remaining = amount_remaining.saturating_sub(consumed);
            total_in = total_in.saturating_add(consumed);
            total_out = total_out.saturating_add(step.amount_out);
        } else {
            amount_remaining = amount_remaining.saturating_sub(step.amount_out);
            total_out = total_out.saturating_add(step.amount_out);
            total_in = total_in
                .saturating_add(step.amount_in)
                .saturating_add(step.fee_amount);
        }

        sqrt_price = step.sqrt_price_next;
        walker_tick = next_tick;

        if sqrt_price != sqrt_price_target {
            // the trade finished inside this spacing
            break;
        }
    }

    if !amount_remaining.is_zero() {
        return Err(SwapMathError::WindowExhausted);
    }

    Ok(SwapSimulation {
        amount_in: total_in,
        amount_out: total_out,
        sqrt_price_after: sqrt_price,
    })
}
