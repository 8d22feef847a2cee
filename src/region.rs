use crate::bounding_box::BoundingBox;
use crate::config::FP_PRECISION;
use crate::error::{GeometryError, Result};
use crate::surface::SurfaceSet;

// Operator tokens occupy the top of the i32 range when stored as raw integers
pub const OP_LEFT_PAREN: i32 = i32::MAX;
pub const OP_RIGHT_PAREN: i32 = i32::MAX - 1;
pub const OP_COMPLEMENT: i32 = i32::MAX - 2;
pub const OP_INTERSECTION: i32 = i32::MAX - 3;
pub const OP_UNION: i32 = i32::MAX - 4;

/// One element of a region expression.
///
/// `Halfspace(s)` selects the positive (`s > 0`) or negative (`s < 0`) side
/// of the surface at 1-based position `|s|` in the surface arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Halfspace(i32),
    LeftParen,
    RightParen,
    Complement,
    Intersection,
    Union,
}

impl Token {
    /// Integer encoding used by the state container
    pub fn to_raw(self) -> i32 {
        match self {
            Token::Halfspace(s) => s,
            Token::LeftParen => OP_LEFT_PAREN,
            Token::RightParen => OP_RIGHT_PAREN,
            Token::Complement => OP_COMPLEMENT,
            Token::Intersection => OP_INTERSECTION,
            Token::Union => OP_UNION,
        }
    }

    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            OP_LEFT_PAREN => Ok(Token::LeftParen),
            OP_RIGHT_PAREN => Ok(Token::RightParen),
            OP_COMPLEMENT => Ok(Token::Complement),
            OP_INTERSECTION => Ok(Token::Intersection),
            OP_UNION => Ok(Token::Union),
            s if s != 0 && s > -OP_UNION && s < OP_UNION => Ok(Token::Halfspace(s)),
            _ => Err(GeometryError::Construction(format!(
                "{} is neither a surface token nor an operator",
                raw
            ))),
        }
    }

    /// Zero-based surface index for half-space tokens
    pub fn surface_index(self) -> Option<usize> {
        match self {
            Token::Halfspace(s) => Some(s.unsigned_abs() as usize - 1),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Token::Complement => 3,
            Token::Intersection => 2,
            Token::Union => 1,
            _ => 0,
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, Token::Intersection | Token::Union)
    }
}

/// Split a region definition such as `"-1 2 | ~(3 -4)"` into tokens.
///
/// Adjacent operands are joined with an implicit intersection.
pub fn tokenize(region: &str) -> Result<Vec<Token>> {
    fn push(tokens: &mut Vec<Token>, token: Token) {
        let starts_operand = matches!(
            token,
            Token::Halfspace(_) | Token::LeftParen | Token::Complement
        );
        let ends_operand = matches!(
            tokens.last(),
            Some(Token::Halfspace(_)) | Some(Token::RightParen)
        );
        if starts_operand && ends_operand {
            tokens.push(Token::Intersection);
        }
        tokens.push(token);
    }

    let mut tokens = Vec::new();
    let chars: Vec<char> = region.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '(' => push(&mut tokens, Token::LeftParen),
            ')' => push(&mut tokens, Token::RightParen),
            '|' => push(&mut tokens, Token::Union),
            '~' => push(&mut tokens, Token::Complement),
            c if c.is_whitespace() => {}
            '+' | '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value: i32 = text.parse().map_err(|_| {
                    GeometryError::Construction(format!(
                        "invalid surface token '{}' in region '{}'",
                        text, region
                    ))
                })?;
                if value == 0 || value.unsigned_abs() >= OP_UNION as u32 {
                    return Err(GeometryError::Construction(format!(
                        "surface token {} out of range in region '{}'",
                        value, region
                    )));
                }
                push(&mut tokens, Token::Halfspace(value));
                continue;
            }
            other => {
                return Err(GeometryError::Construction(format!(
                    "unexpected character '{}' in region '{}'",
                    other, region
                )));
            }
        }
        i += 1;
    }
    Ok(tokens)
}

/// Check that an infix expression alternates operands and operators and
/// that its parentheses balance.
fn validate_infix(infix: &[Token]) -> Result<()> {
    let mut expect_operand = true;
    let mut depth = 0usize;
    for (position, token) in infix.iter().enumerate() {
        let ok = match token {
            Token::Halfspace(s) => {
                if *s == 0 {
                    return Err(GeometryError::Construction(
                        "surface token 0 does not name a surface".to_string(),
                    ));
                }
                let ok = expect_operand;
                expect_operand = false;
                ok
            }
            Token::LeftParen => {
                depth += 1;
                expect_operand
            }
            Token::Complement => expect_operand,
            Token::RightParen => {
                if depth == 0 {
                    return Err(GeometryError::Construction(format!(
                        "unmatched right parenthesis at position {}",
                        position
                    )));
                }
                depth -= 1;
                let ok = !expect_operand;
                expect_operand = false;
                ok
            }
            Token::Intersection | Token::Union => {
                let ok = !expect_operand;
                expect_operand = true;
                ok
            }
        };
        if !ok {
            return Err(GeometryError::Construction(format!(
                "operator {:?} at position {} is missing an operand",
                token, position
            )));
        }
    }
    if depth != 0 {
        return Err(GeometryError::Construction(
            "mismatched parentheses in region expression".to_string(),
        ));
    }
    if !infix.is_empty() && expect_operand {
        return Err(GeometryError::Construction(
            "region expression ends with an operator".to_string(),
        ));
    }
    Ok(())
}

/// Translate an infix region into reverse Polish notation (shunting-yard).
///
/// Complement binds tightest, then intersection, then union. Intersection and
/// union are left-associative; complement is a right-associative prefix.
pub fn infix_to_rpn(infix: &[Token]) -> Result<Vec<Token>> {
    validate_infix(infix)?;

    let mut rpn = Vec::with_capacity(infix.len());
    let mut stack: Vec<Token> = Vec::new();

    for &token in infix {
        match token {
            Token::Halfspace(_) => rpn.push(token),
            Token::Complement | Token::Intersection | Token::Union => {
                while let Some(&op) = stack.last() {
                    if op == Token::LeftParen {
                        break;
                    }
                    let pops = if token == Token::Complement {
                        token.precedence() < op.precedence()
                    } else {
                        token.precedence() <= op.precedence()
                    };
                    if !pops {
                        break;
                    }
                    rpn.push(op);
                    stack.pop();
                }
                stack.push(token);
            }
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => rpn.push(op),
                    None => {
                        return Err(GeometryError::Construction(
                            "mismatched parentheses in region expression".to_string(),
                        ))
                    }
                }
            },
        }
    }

    while let Some(op) = stack.pop() {
        if op == Token::LeftParen {
            return Err(GeometryError::Construction(
                "mismatched parentheses in region expression".to_string(),
            ));
        }
        rpn.push(op);
    }
    Ok(rpn)
}

/// Evaluate an RPN expression on a boolean stack.
///
/// `on_surface` overrides the sense test for the surface the point is known
/// to sit on. An empty expression contains everything.
pub fn evaluate_rpn(
    rpn: &[Token],
    point: [f64; 3],
    direction: [f64; 3],
    on_surface: i32,
    surfaces: &dyn SurfaceSet,
) -> bool {
    let mut stack: Vec<bool> = Vec::with_capacity(rpn.len());
    for &token in rpn {
        match token {
            Token::Halfspace(s) => {
                let inside = if s == on_surface {
                    true
                } else if -s == on_surface {
                    false
                } else {
                    let index = s.unsigned_abs() as usize - 1;
                    surfaces.sense(index, point, direction) == (s > 0)
                };
                stack.push(inside);
            }
            Token::Complement => {
                let value = stack.pop().unwrap_or(false);
                stack.push(!value);
            }
            Token::Intersection => {
                let b = stack.pop().unwrap_or(false);
                let a = stack.pop().unwrap_or(false);
                stack.push(a && b);
            }
            Token::Union => {
                let b = stack.pop().unwrap_or(false);
                let a = stack.pop().unwrap_or(false);
                stack.push(a || b);
            }
            Token::LeftParen | Token::RightParen => {}
        }
    }
    stack.pop().unwrap_or(true)
}

/// Start of the operand that ends just before `end` in an RPN sequence.
///
/// Walks backward counting how many complete operands are still owed: a
/// half-space pays one, a binary operator owes one more. The returned index
/// is where the infix form would open its parenthesis.
pub fn find_left_parenthesis(rpn: &[Token], end: usize) -> usize {
    let mut owed = 1i64;
    let mut i = end;
    while i > 0 {
        i -= 1;
        match rpn[i] {
            Token::Halfspace(_) => owed -= 1,
            t if t.is_binary() => owed += 1,
            _ => {}
        }
        if owed == 0 {
            return i;
        }
    }
    0
}

/// Negate every half-space and swap intersection with union (De Morgan).
pub fn apply_demorgan(tokens: &mut [Token]) {
    for token in tokens.iter_mut() {
        *token = match *token {
            Token::Halfspace(s) => Token::Halfspace(-s),
            Token::Intersection => Token::Union,
            Token::Union => Token::Intersection,
            other => other,
        };
    }
}

/// Rewrite an RPN expression so that it contains no complement operators.
///
/// The first complement in the sequence never has another complement inside
/// its operand, so pushing it down with De Morgan and dropping it leaves a
/// well-formed expression with one complement fewer.
pub fn remove_complements(rpn: &[Token]) -> Vec<Token> {
    let mut out: Vec<Token> = rpn
        .iter()
        .copied()
        .filter(|t| !matches!(t, Token::LeftParen | Token::RightParen))
        .collect();

    while let Some(position) = out.iter().position(|t| *t == Token::Complement) {
        match position.checked_sub(1).map(|i| out[i]) {
            Some(Token::Halfspace(s)) => out[position - 1] = Token::Halfspace(-s),
            _ => {
                let start = find_left_parenthesis(&out, position);
                apply_demorgan(&mut out[start..position]);
            }
        }
        out.remove(position);
    }
    out
}

/// A region of space expressed as a boolean combination of half-spaces.
///
/// The infix form is kept as authored; the RPN form is derived once and both
/// are immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct CsgRegion {
    region: Vec<Token>,
    rpn: Vec<Token>,
    simple: bool,
}

impl CsgRegion {
    pub fn new(region: Vec<Token>) -> Result<Self> {
        let rpn = infix_to_rpn(&region)?;
        let simple = !rpn
            .iter()
            .any(|t| matches!(t, Token::Union | Token::Complement));
        tracing::debug!(
            tokens = region.len(),
            simple,
            "built region expression"
        );
        Ok(CsgRegion {
            region,
            rpn,
            simple,
        })
    }

    /// Build a region from its textual definition
    pub fn parse(region: &str) -> Result<Self> {
        Self::new(tokenize(region)?)
    }

    /// Region made of raw integer tokens, as stored by the state container
    pub fn from_raw(raw: &[i32]) -> Result<Self> {
        let tokens = raw
            .iter()
            .map(|&t| Token::from_raw(t))
            .collect::<Result<Vec<_>>>()?;
        Self::new(tokens)
    }

    pub fn region(&self) -> &[Token] {
        &self.region
    }

    pub fn rpn(&self) -> &[Token] {
        &self.rpn
    }

    /// True when the region is an intersection of half-spaces only
    pub fn is_simple(&self) -> bool {
        self.simple
    }

    pub fn to_raw(&self) -> Vec<i32> {
        self.region.iter().map(|t| t.to_raw()).collect()
    }

    /// Signed half-space tokens in RPN order
    pub fn halfspaces(&self) -> impl Iterator<Item = i32> + '_ {
        self.rpn.iter().filter_map(|t| match t {
            Token::Halfspace(s) => Some(*s),
            _ => None,
        })
    }

    pub fn contains(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool {
        if self.simple {
            self.contains_simple(point, direction, on_surface, surfaces)
        } else {
            self.contains_complex(point, direction, on_surface, surfaces)
        }
    }

    /// Short-circuit evaluation of an intersection of half-spaces.
    /// Only meaningful when `is_simple()` holds.
    pub fn contains_simple(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool {
        for s in self.halfspaces() {
            if s == on_surface {
                continue;
            }
            if -s == on_surface {
                return false;
            }
            let index = s.unsigned_abs() as usize - 1;
            if surfaces.sense(index, point, direction) != (s > 0) {
                return false;
            }
        }
        true
    }

    pub fn contains_complex(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool {
        evaluate_rpn(&self.rpn, point, direction, on_surface, surfaces)
    }

    /// Nearest crossing of any surface in the region along `direction`.
    ///
    /// Returns the distance and the signed token of the half-space entered
    /// on crossing, or `None` when no surface is hit.
    pub fn distance(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> Option<(f64, i32)> {
        let mut min_dist = f64::INFINITY;
        let mut crossed = None;
        for s in self.halfspaces() {
            let coincident = s.abs() == on_surface.abs();
            let index = s.unsigned_abs() as usize - 1;
            if let Some(d) = surfaces.distance(index, point, direction, coincident) {
                if d < min_dist && min_dist - d >= FP_PRECISION * min_dist {
                    min_dist = d;
                    crossed = Some(-s);
                }
            }
        }
        crossed.map(|s| (min_dist, s))
    }

    pub fn bounding_box(&self, surfaces: &dyn SurfaceSet) -> BoundingBox {
        if self.simple {
            self.bounding_box_simple(surfaces)
        } else {
            Self::bounding_box_complex(&self.rpn, surfaces)
        }
    }

    fn bounding_box_simple(&self, surfaces: &dyn SurfaceSet) -> BoundingBox {
        self.halfspaces()
            .fold(BoundingBox::infinite(), |bbox, s| {
                let index = s.unsigned_abs() as usize - 1;
                bbox.intersection(&surfaces.bounding_box(index, s > 0))
            })
    }

    fn bounding_box_complex(rpn: &[Token], surfaces: &dyn SurfaceSet) -> BoundingBox {
        let rpn = remove_complements(rpn);
        let mut stack: Vec<BoundingBox> = Vec::with_capacity(rpn.len());
        for token in rpn {
            match token {
                Token::Halfspace(s) => {
                    let index = s.unsigned_abs() as usize - 1;
                    stack.push(surfaces.bounding_box(index, s > 0));
                }
                Token::Intersection | Token::Union => {
                    let b = stack.pop().unwrap_or_else(BoundingBox::infinite);
                    let a = stack.pop().unwrap_or_else(BoundingBox::infinite);
                    stack.push(if token == Token::Intersection {
                        &a & &b
                    } else {
                        &a | &b
                    });
                }
                _ => {}
            }
        }
        stack.pop().unwrap_or_else(BoundingBox::infinite)
    }
}

impl std::str::FromStr for CsgRegion {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_box::assert_corners;
    use crate::surface::Surface;
    use super::Token::{Complement, Halfspace, Intersection, LeftParen, RightParen, Union};

    fn box_and_sphere() -> Vec<Surface> {
        vec![
            Surface::x_plane(2.1, 1),
            Surface::x_plane(-2.1, 2),
            Surface::new_sphere(0.0, 0.0, 0.0, 4.2, 3),
        ]
    }

    #[test]
    fn test_tokenize_inserts_implicit_intersections() {
        let tokens = tokenize("-1 2 | ~(3 -4)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Halfspace(-1),
                Intersection,
                Halfspace(2),
                Union,
                Complement,
                LeftParen,
                Halfspace(3),
                Intersection,
                Halfspace(-4),
                RightParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_garbage() {
        assert!(matches!(tokenize("1 & 2"), Err(GeometryError::Construction(_))));
        assert!(tokenize("0").is_err());
        assert!(tokenize("+").is_err());
    }

    #[test]
    fn test_rpn_precedence() {
        // Intersection binds tighter than union
        let region = CsgRegion::parse("1 | 2 3").unwrap();
        assert_eq!(
            region.rpn(),
            &[Halfspace(1), Halfspace(2), Halfspace(3), Intersection, Union]
        );
        // Complement binds tighter than intersection
        let region = CsgRegion::parse("~1 2").unwrap();
        assert_eq!(
            region.rpn(),
            &[Halfspace(1), Complement, Halfspace(2), Intersection]
        );
        // Left associativity
        let region = CsgRegion::parse("1 | 2 | 3").unwrap();
        assert_eq!(
            region.rpn(),
            &[Halfspace(1), Halfspace(2), Union, Halfspace(3), Union]
        );
        let region = CsgRegion::parse("~~1").unwrap();
        assert_eq!(region.rpn(), &[Halfspace(1), Complement, Complement]);
    }

    #[test]
    fn test_simple_flag() {
        assert!(CsgRegion::parse("1 -2 3").unwrap().is_simple());
        assert!(CsgRegion::parse("(1 -2) 3").unwrap().is_simple());
        assert!(!CsgRegion::parse("1 | 2").unwrap().is_simple());
        assert!(!CsgRegion::parse("~1").unwrap().is_simple());
        assert!(CsgRegion::new(vec![]).unwrap().is_simple());
    }

    #[test]
    fn test_malformed_regions_fail_construction() {
        for bad in ["(1 2", "1 2)", "1 |", "| 1", "()", "1 ~", "~", "1 | | 2"] {
            let result = CsgRegion::parse(bad);
            assert!(
                matches!(result, Err(GeometryError::Construction(_))),
                "'{}' should be rejected",
                bad
            );
        }
        // Two operands without an operator between them
        let result = CsgRegion::new(vec![Halfspace(1), Halfspace(2)]);
        assert!(matches!(result, Err(GeometryError::Construction(_))));
    }

    #[test]
    fn test_raw_round_trip() {
        let region = CsgRegion::parse("~(1 | -2) 3").unwrap();
        let raw = region.to_raw();
        assert!(raw.contains(&OP_COMPLEMENT));
        assert_eq!(CsgRegion::from_raw(&raw).unwrap(), region);
        assert!(Token::from_raw(0).is_err());
    }

    #[test]
    fn test_demorgan_on_union() {
        let region = CsgRegion::new(vec![
            Complement,
            LeftParen,
            Halfspace(1),
            Union,
            Halfspace(-2),
            RightParen,
        ])
        .unwrap();
        assert_eq!(region.rpn(), &[Halfspace(1), Halfspace(-2), Union, Complement]);
        assert_eq!(
            remove_complements(region.rpn()),
            vec![Halfspace(-1), Halfspace(2), Intersection]
        );
    }

    #[test]
    fn test_complement_of_single_halfspace() {
        let rpn = vec![Halfspace(3), Complement, Halfspace(1), Union];
        assert_eq!(remove_complements(&rpn), vec![Halfspace(-3), Halfspace(1), Union]);
    }

    #[test]
    fn test_nested_complements() {
        // ~(1 ~(2 | 3)) == -1 | (2 | 3)
        let region = CsgRegion::parse("~(1 ~(2 | 3))").unwrap();
        assert_eq!(
            remove_complements(region.rpn()),
            vec![Halfspace(-1), Halfspace(2), Halfspace(3), Union, Union]
        );
    }

    #[test]
    fn test_find_left_parenthesis() {
        // 4 | (1 2 | 3) as rpn: 4 1 2 & 3 | |
        let rpn = vec![
            Halfspace(4),
            Halfspace(1),
            Halfspace(2),
            Intersection,
            Halfspace(3),
            Union,
            Union,
        ];
        assert_eq!(find_left_parenthesis(&rpn, 6), 1);
        assert_eq!(find_left_parenthesis(&rpn, 4), 1);
        assert_eq!(find_left_parenthesis(&rpn, 7), 0);
        assert_eq!(find_left_parenthesis(&rpn, 5), 4);
    }

    #[test]
    fn test_remove_complements_is_idempotent() {
        let region = CsgRegion::parse("~(1 | ~(2 -3)) | ~4 5").unwrap();
        let once = remove_complements(region.rpn());
        assert!(!once.contains(&Complement));
        assert_eq!(remove_complements(&once), once);
    }

    #[test]
    fn test_region_contains() {
        let surfaces = vec![
            Surface::new_plane(0.0, 0.0, 1.0, -5.0, 1),
            Surface::new_sphere(0.0, 0.0, 0.0, 3.0, 2),
        ];
        // inside s2 AND above s1
        let region = CsgRegion::parse("1 -2").unwrap();
        assert!(region.contains([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 0, &surfaces));
        assert!(!region.contains([0.0, 0.0, 4.0], [0.0, 0.0, 1.0], 0, &surfaces));
    }

    #[test]
    fn test_on_surface_overrides_sense() {
        let surfaces = vec![Surface::x_plane(0.0, 1)];
        let region = CsgRegion::parse("1").unwrap();
        // Numerically outside, but known to be on the positive side
        let p = [-1e-3, 0.0, 0.0];
        let u = [-1.0, 0.0, 0.0];
        assert!(!region.contains(p, u, 0, &surfaces));
        assert!(region.contains(p, u, 1, &surfaces));
        assert!(!region.contains([1.0, 0.0, 0.0], u, -1, &surfaces));

        let complex = CsgRegion::parse("1 | 1").unwrap();
        assert!(complex.contains(p, u, 1, &surfaces));
        assert!(!complex.contains([1.0, 0.0, 0.0], u, -1, &surfaces));
    }

    #[test]
    fn test_union_and_complement_contains() {
        let surfaces = vec![
            Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1),
            Surface::new_sphere(3.0, 0.0, 0.0, 2.0, 2),
        ];
        let u = [1.0, 0.0, 0.0];
        let union = CsgRegion::parse("-1 | -2").unwrap();
        assert!(union.contains([0.0, 0.0, 0.0], u, 0, &surfaces));
        assert!(union.contains([3.0, 0.0, 0.0], u, 0, &surfaces));
        assert!(!union.contains([6.0, 0.0, 0.0], u, 0, &surfaces));

        let complement = CsgRegion::parse("~(-1)").unwrap();
        assert!(!complement.contains([0.0, 0.0, 0.0], u, 0, &surfaces));
        assert!(complement.contains([3.0, 0.0, 0.0], u, 0, &surfaces));
    }

    #[test]
    fn test_empty_region_contains_everything() {
        let surfaces: Vec<Surface> = Vec::new();
        let region = CsgRegion::new(vec![]).unwrap();
        assert!(region.contains([1e9, 0.0, 0.0], [1.0, 0.0, 0.0], 0, &surfaces));
        assert!(region.contains_complex([1e9, 0.0, 0.0], [1.0, 0.0, 0.0], 0, &surfaces));
        assert_eq!(region.bounding_box(&surfaces), BoundingBox::infinite());
        assert_eq!(region.distance([0.0; 3], [1.0, 0.0, 0.0], 0, &surfaces), None);
    }

    #[test]
    fn test_distance_picks_nearest_surface() {
        let surfaces = box_and_sphere();
        let region = CsgRegion::parse("-1 2 -3").unwrap();
        let (d, s) = region
            .distance([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0, &surfaces)
            .unwrap();
        assert!((d - 2.1).abs() < 1e-12);
        assert_eq!(s, 1);
        let (d, s) = region
            .distance([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 0, &surfaces)
            .unwrap();
        assert!((d - 4.2).abs() < 1e-12);
        assert_eq!(s, 3);
    }

    #[test]
    fn test_distance_skips_surface_just_crossed() {
        let surfaces = box_and_sphere();
        let region = CsgRegion::parse("-1 2 -3").unwrap();
        // Sitting on x = -2.1 heading +x: must not report a zero distance to it
        let (d, s) = region
            .distance([-2.1, 0.0, 0.0], [1.0, 0.0, 0.0], 2, &surfaces)
            .unwrap();
        assert!((d - 4.2).abs() < 1e-12);
        assert_eq!(s, 1);
    }

    #[test]
    fn test_sphere_with_xplanes_bounding_box() {
        let surfaces = box_and_sphere();
        let region = CsgRegion::parse("-1 2 -3").unwrap();
        let bbox = region.bounding_box(&surfaces);
        assert_corners(&bbox, [-2.1, -4.2, -4.2], [2.1, 4.2, 4.2]);
    }

    #[test]
    fn test_union_bounding_box() {
        let surfaces = vec![
            Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 1),
            Surface::new_sphere(5.0, 0.0, 0.0, 2.0, 2),
        ];
        let region = CsgRegion::parse("-1 | -2").unwrap();
        let bbox = region.bounding_box(&surfaces);
        assert_corners(&bbox, [-1.0, -2.0, -2.0], [7.0, 2.0, 2.0]);
    }

    #[test]
    fn test_complemented_bounding_box() {
        // ~(x < -1 | x > 1 | outside sphere) == -1 <= x <= 1 inside sphere
        let surfaces = vec![
            Surface::x_plane(-1.0, 1),
            Surface::x_plane(1.0, 2),
            Surface::new_sphere(0.0, 0.0, 0.0, 3.0, 3),
        ];
        let region = CsgRegion::parse("~(-1 | 2 | 3)").unwrap();
        let bbox = region.bounding_box(&surfaces);
        assert_corners(&bbox, [-1.0, -3.0, -3.0], [1.0, 3.0, 3.0]);
    }
}
