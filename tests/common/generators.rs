//! Deterministic synthetic images as row-major RGB bytes.
//!
//! An LCG drives the noisy generators so every platform sees identical
//! inputs.

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

fn gray_image(width: usize, height: usize, value: impl Fn(usize, usize) -> u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let v = value(x, y);
            data.extend_from_slice(&[v, v, v]);
        }
    }
    data
}

/// Uniform color image
pub fn gen_uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    [r, g, b].repeat(width * height)
}

/// Horizontal grayscale ramp from 0 to 255
pub fn gen_gradient_h(width: usize, height: usize) -> Vec<u8> {
    gray_image(width, height, |x, _| {
        if width > 1 {
            (x * 255 / (width - 1)) as u8
        } else {
            128
        }
    })
}

/// Checkerboard of `block`-sized gray squares
pub fn gen_checkerboard(width: usize, height: usize, block: usize, lo: u8, hi: u8) -> Vec<u8> {
    gray_image(width, height, |x, y| {
        if ((x / block) + (y / block)) % 2 == 0 {
            hi
        } else {
            lo
        }
    })
}

/// Vertical step edge at the middle column
pub fn gen_edge_v(width: usize, height: usize, lo: u8, hi: u8) -> Vec<u8> {
    gray_image(width, height, |x, _| if x < width / 2 { lo } else { hi })
}

/// Seeded noise over the full byte range
pub fn gen_random(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height * 3).map(|_| rng.next_u8()).collect()
}

/// Adds `delta` to every channel, saturating
pub fn distort_brightness(img: &[u8], delta: i16) -> Vec<u8> {
    img.iter()
        .map(|&v| (v as i16 + delta).clamp(0, 255) as u8)
        .collect()
}

/// Adds seeded noise in `[-amplitude, amplitude]`
pub fn distort_noise(img: &[u8], seed: u64, amplitude: u8) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let span = 2 * amplitude as i16 + 1;
    img.iter()
        .map(|&v| {
            let noise = (rng.next_u8() as i16 % span) - amplitude as i16;
            (v as i16 + noise).clamp(0, 255) as u8
        })
        .collect()
}

/// Swaps the red and blue channels
pub fn distort_channel_swap_rb(img: &[u8]) -> Vec<u8> {
    img.chunks_exact(3)
        .flat_map(|c| [c[2], c[1], c[0]])
        .collect()
}
