//! Polynomial arithmetic and Reed-Solomon decoding primitives over GF(2^m)
//!
//! Two coefficient orders are in play and each function states which it uses:
//!
//! - **Codeword order** (highest degree first): `c[0]` is the coefficient of
//!   x^(n-1). Messages, codewords and the generator polynomial use this order
//!   so that systematic data sits at the front of the codeword.
//! - **Ascending order** (lowest degree first): `Λ[0] = 1`. The error locator
//!   Λ(x), the evaluator Ω(x) and the syndrome polynomial S(x) use this order.
//!
//! The code uses first consecutive root α^0: the generator is
//! ∏(x - α^i) for i in 0..nsym and syndromes are `S_i = r(α^i)`.
//! A symbol at codeword position `p` in a codeword of length `n` has degree
//! `n - 1 - p` and locator `X = α^(n-1-p)`.

use super::GaloisField;

impl GaloisField {
    /// Horner evaluation, coefficients in codeword order
    pub fn poly_eval(&self, poly: &[u16], x: u16) -> u16 {
        poly.iter()
            .fold(0, |acc, &coeff| self.add(self.mul(acc, x), coeff))
    }

    /// Horner evaluation, coefficients in ascending order
    pub fn poly_eval_ascending(&self, poly: &[u16], x: u16) -> u16 {
        poly.iter()
            .rev()
            .fold(0, |acc, &coeff| self.add(self.mul(acc, x), coeff))
    }

    pub fn poly_scale(&self, poly: &[u16], factor: u16) -> Vec<u16> {
        poly.iter().map(|&c| self.mul(c, factor)).collect()
    }

    /// Sum of two polynomials in ascending order
    pub fn poly_add(&self, a: &[u16], b: &[u16]) -> Vec<u16> {
        let mut sum = vec![0u16; a.len().max(b.len())];
        for (i, &c) in a.iter().enumerate() {
            sum[i] ^= c;
        }
        for (i, &c) in b.iter().enumerate() {
            sum[i] ^= c;
        }
        sum
    }

    /// Product of two polynomials (same order in, same order out)
    pub fn poly_mul(&self, a: &[u16], b: &[u16]) -> Vec<u16> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }
        let mut product = vec![0u16; a.len() + b.len() - 1];
        for (i, &x) in a.iter().enumerate() {
            if x == 0 {
                continue;
            }
            for (j, &y) in b.iter().enumerate() {
                product[i + j] ^= self.mul(x, y);
            }
        }
        product
    }

    /// Generator polynomial ∏(x - α^i), i in 0..nsym, in codeword order
    pub fn rs_generator_poly(&self, nsym: usize) -> Vec<u16> {
        (0..nsym).fold(vec![1u16], |g, i| self.poly_mul(&g, &[1, self.exp(i)]))
    }

    /// Parity symbols for `message`: remainder of message(x)·x^nsym divided by
    /// the monic `generator`, in codeword order
    pub fn rs_remainder(&self, message: &[u16], generator: &[u16]) -> Vec<u16> {
        let nsym = generator.len().saturating_sub(1);
        let mut buf = Vec::with_capacity(message.len() + nsym);
        buf.extend_from_slice(message);
        buf.resize(message.len() + nsym, 0);

        for i in 0..message.len() {
            let coeff = buf[i];
            if coeff != 0 {
                for (j, &g) in generator.iter().enumerate().skip(1) {
                    buf[i + j] ^= self.mul(g, coeff);
                }
            }
        }

        buf.split_off(message.len())
    }

    /// Syndromes `S_i = r(α^i)` for i in 0..nsym
    pub fn rs_syndromes(&self, codeword: &[u16], nsym: usize) -> Vec<u16> {
        (0..nsym)
            .map(|i| self.poly_eval(codeword, self.exp(i)))
            .collect()
    }

    /// Berlekamp-Massey: shortest LFSR generating the syndrome sequence
    ///
    /// Returns the error locator Λ(x) = ∏(1 - X_k x) in ascending order with
    /// exactly `L + 1` coefficients, where `L` is the LFSR length. A zero
    /// leading coefficient means the locator degenerated and the caller must
    /// treat the codeword as uncorrectable.
    pub fn berlekamp_massey(&self, syndromes: &[u16]) -> Vec<u16> {
        let mut current = vec![1u16];
        let mut previous = vec![1u16];
        let mut length = 0usize;
        let mut shift = 1usize;
        let mut previous_discrepancy = 1u16;

        for n in 0..syndromes.len() {
            let mut discrepancy = syndromes[n];
            for i in 1..=length.min(current.len() - 1) {
                discrepancy ^= self.mul(current[i], syndromes[n - i]);
            }

            if discrepancy == 0 {
                shift += 1;
                continue;
            }

            // current(x) - (d / b) x^shift previous(x)
            let coeff = self.div(discrepancy, previous_discrepancy);
            let mut next = current.clone();
            if next.len() < previous.len() + shift {
                next.resize(previous.len() + shift, 0);
            }
            for (i, &p) in previous.iter().enumerate() {
                next[i + shift] ^= self.mul(coeff, p);
            }

            if 2 * length <= n {
                length = n + 1 - length;
                previous = std::mem::replace(&mut current, next);
                previous_discrepancy = discrepancy;
                shift = 1;
            } else {
                current = next;
                shift += 1;
            }
        }

        current.resize(length + 1, 0);
        current
    }

    /// Chien search: codeword positions whose inverse locator is a root of Λ
    pub fn chien_search(&self, locator: &[u16], codeword_len: usize) -> Vec<usize> {
        (0..codeword_len)
            .filter(|&pos| {
                let x_inv = self.exp_neg(codeword_len - 1 - pos);
                self.poly_eval_ascending(locator, x_inv) == 0
            })
            .collect()
    }

    /// Error evaluator Ω(x) = S(x)Λ(x) mod x^nsym, ascending order
    pub fn error_evaluator(&self, syndromes: &[u16], locator: &[u16]) -> Vec<u16> {
        let nsym = syndromes.len();
        let mut omega = vec![0u16; nsym];
        for (k, slot) in omega.iter_mut().enumerate() {
            for (i, &lambda) in locator.iter().enumerate().take(k + 1) {
                *slot ^= self.mul(lambda, syndromes[k - i]);
            }
        }
        omega
    }

    /// Forney's formula: error magnitudes `Y = X · Ω(X⁻¹) / Λ'(X⁻¹)` at each
    /// position returned by the Chien search
    ///
    /// Returns `None` when the formal derivative vanishes at a root, which
    /// only happens for a locator that does not describe a real error pattern.
    pub fn forney(
        &self,
        syndromes: &[u16],
        locator: &[u16],
        positions: &[usize],
        codeword_len: usize,
    ) -> Option<Vec<u16>> {
        let omega = self.error_evaluator(syndromes, locator);

        positions
            .iter()
            .map(|&pos| {
                let degree = codeword_len - 1 - pos;
                let x = self.exp(degree);
                let x_inv = self.exp_neg(degree);

                // Formal derivative in characteristic 2 keeps odd terms only
                let mut derivative = 0u16;
                let mut x_inv_pow = 1u16;
                for (i, &lambda) in locator.iter().enumerate().skip(1) {
                    if i % 2 == 1 {
                        derivative ^= self.mul(lambda, x_inv_pow);
                    }
                    x_inv_pow = self.mul(x_inv_pow, x_inv);
                }
                if derivative == 0 {
                    return None;
                }

                let numerator = self.poly_eval_ascending(&omega, x_inv);
                Some(self.mul(x, self.div(numerator, derivative)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::galois::{GaloisField, GF16, GF256};

    fn gf256() -> GaloisField {
        GaloisField::with_params(GF256).unwrap()
    }

    #[test]
    fn test_poly_eval_orders_agree() {
        let gf = gf256();
        let poly = [3u16, 0, 7, 1];
        let reversed: Vec<u16> = poly.iter().rev().copied().collect();
        for x in [0u16, 1, 2, 29, 200] {
            assert_eq!(gf.poly_eval(&poly, x), gf.poly_eval_ascending(&reversed, x));
        }
    }

    #[test]
    fn test_generator_poly_known_value() {
        let gf = gf256();
        assert_eq!(gf.rs_generator_poly(4), vec![1, 15, 54, 120, 64]);
        assert_eq!(gf.rs_generator_poly(0), vec![1]);
    }

    #[test]
    fn test_generator_roots() {
        let gf = gf256();
        let g = gf.rs_generator_poly(8);
        for i in 0..8 {
            assert_eq!(gf.poly_eval(&g, gf.exp(i)), 0);
        }
        assert_ne!(gf.poly_eval(&g, gf.exp(8)), 0);
    }

    #[test]
    fn test_known_qr_codeword() {
        // "hello world" QR message block with 10 parity symbols
        let gf = gf256();
        let message = [
            0x40u16, 0xd2, 0x75, 0x47, 0x76, 0x17, 0x32, 0x06, 0x27, 0x26, 0x96, 0xc6, 0xc6, 0x96,
            0x70, 0xec,
        ];
        let parity = gf.rs_remainder(&message, &gf.rs_generator_poly(10));
        assert_eq!(
            parity,
            vec![0xbc, 0x2a, 0x90, 0x13, 0x6b, 0xaf, 0xef, 0xfd, 0x4b, 0xe0]
        );
    }

    #[test]
    fn test_syndromes_zero_for_codeword() {
        let gf = gf256();
        let message = [1u16, 2, 3, 4, 5];
        let mut codeword = message.to_vec();
        codeword.extend(gf.rs_remainder(&message, &gf.rs_generator_poly(6)));
        assert!(gf.rs_syndromes(&codeword, 6).iter().all(|&s| s == 0));
    }

    #[test]
    fn test_single_error_pipeline() {
        let gf = GaloisField::with_params(GF16).unwrap();
        let message = [9u16, 4, 0, 15];
        let mut codeword = message.to_vec();
        codeword.extend(gf.rs_remainder(&message, &gf.rs_generator_poly(4)));
        let original = codeword.clone();

        codeword[2] ^= 0b1010;
        let syndromes = gf.rs_syndromes(&codeword, 4);
        let locator = gf.berlekamp_massey(&syndromes);
        assert_eq!(locator.len(), 2);

        let positions = gf.chien_search(&locator, codeword.len());
        assert_eq!(positions, vec![2]);

        let magnitudes = gf.forney(&syndromes, &locator, &positions, codeword.len()).unwrap();
        assert_eq!(magnitudes, vec![0b1010]);

        codeword[2] ^= magnitudes[0];
        assert_eq!(codeword, original);
    }

    #[test]
    fn test_locator_degree_tracks_error_count() {
        let gf = gf256();
        let message: Vec<u16> = (10..30).collect();
        let mut codeword = message.clone();
        codeword.extend(gf.rs_remainder(&message, &gf.rs_generator_poly(8)));

        for (i, pos) in [0usize, 7, 19, 27].iter().enumerate() {
            codeword[*pos] ^= 0x11 + i as u16;
            let locator = gf.berlekamp_massey(&gf.rs_syndromes(&codeword, 8));
            assert_eq!(locator.len() - 1, i + 1);
        }
    }

    #[test]
    fn test_poly_add_and_scale() {
        let gf = gf256();
        assert_eq!(gf.poly_add(&[1, 2, 3], &[1, 2]), vec![0, 0, 3]);
        assert_eq!(gf.poly_scale(&[1, 0, 2], 3), vec![3, 0, 6]);
        assert!(gf.poly_mul(&[], &[1]).is_empty());
    }
}
