use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};
use std::sync::LazyLock;

// Galois field GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

const PRIMITIVE_POLY: u16 = 0x11D;

pub(crate) static EXP_TABLE: [u8; 255] = build_exp_table();

pub(crate) static LOG_TABLE: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 255] {
    let mut table = [0u8; 255];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
        i += 1;
    }
    table
}

// LOG_TABLE[0] is unused since log(0) is undefined
const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Element of GF(256). Addition and subtraction are xor, multiplication and
/// division go through the log and antilog tables.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct G(pub u8);

impl G {
    pub const ZERO: G = G(0);
    pub const ONE: G = G(1);

    /// Returns α^i for the generator α = 2.
    pub fn gen_pow(i: usize) -> Self {
        G(EXP_TABLE[i % 255])
    }

    pub fn log(self) -> Option<usize> {
        (self.0 != 0).then(|| LOG_TABLE[self.0 as usize] as usize)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for G {
    fn from(v: u8) -> Self {
        G(v)
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = G;
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: G) -> G {
        G(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn add_assign(&mut self, rhs: G) {
        self.0 ^= rhs.0;
    }
}

impl Sub for G {
    type Output = G;
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: G) -> G {
        G(self.0 ^ rhs.0)
    }
}

impl Mul for G {
    type Output = G;
    fn mul(self, rhs: G) -> G {
        match (self.log(), rhs.log()) {
            (Some(a), Some(b)) => G::gen_pow(a + b),
            _ => G::ZERO,
        }
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: G) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = G;
    fn div(self, rhs: G) -> G {
        debug_assert!(!rhs.is_zero(), "Division by zero in GF(256)");
        match (self.log(), rhs.log()) {
            (Some(a), Some(b)) => G::gen_pow(a + 255 - b),
            _ => G::ZERO,
        }
    }
}

// Generator polynomials
//------------------------------------------------------------------------------

pub const MAX_EC_CODEWORDS: usize = 30;

/// Builds Π (x - α^i) for i in 0..degree. Coefficients are ordered from the
/// highest power down, so the leading coefficient 1 comes first.
pub fn generator_polynomial(degree: usize) -> Vec<G> {
    let mut poly = vec![G::ONE];
    for i in 0..degree {
        let root = G::gen_pow(i);
        let mut next = vec![G::ZERO; poly.len() + 1];
        for (j, &coeff) in poly.iter().enumerate() {
            next[j] += coeff;
            next[j + 1] += coeff * root;
        }
        poly = next;
    }
    poly
}

pub static GENERATOR_POLYNOMIALS: LazyLock<Vec<Vec<G>>> =
    LazyLock::new(|| (0..=MAX_EC_CODEWORDS).map(generator_polynomial).collect());
