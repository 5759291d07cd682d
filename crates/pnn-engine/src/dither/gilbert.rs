//! Generalized Hilbert ("gilbert") traversal of arbitrary rectangles.
//!
//! The rectangle is spanned by a major vector `a` and a minor vector `b`.
//! Thin strips are walked directly; otherwise the major side is halved
//! (nudged to keep the halves' parity compatible) and the pieces are
//! visited in two or three recursive calls. Every cell is visited exactly
//! once; consecutive visits are 4-neighbors except for a single diagonal
//! step some odd-sided shapes need.

/// Visit every `(x, y)` of a `width` x `height` grid in gilbert order.
pub fn gilbert_walk<F: FnMut(usize, usize)>(width: usize, height: usize, mut visit: F) {
    if width == 0 || height == 0 {
        return;
    }
    let (w, h) = (width as i64, height as i64);
    if w >= h {
        generate2d(0, 0, w, 0, 0, h, &mut visit);
    } else {
        generate2d(0, 0, 0, h, w, 0, &mut visit);
    }
}

fn generate2d<F: FnMut(usize, usize)>(
    mut x: i64,
    mut y: i64,
    ax: i64,
    ay: i64,
    bx: i64,
    by: i64,
    visit: &mut F,
) {
    let w = (ax + ay).abs();
    let h = (bx + by).abs();
    let (dax, day) = (ax.signum(), ay.signum());
    let (dbx, dby) = (bx.signum(), by.signum());

    if h == 1 {
        for _ in 0..w {
            visit(x as usize, y as usize);
            x += dax;
            y += day;
        }
        return;
    }

    if w == 1 {
        for _ in 0..h {
            visit(x as usize, y as usize);
            x += dbx;
            y += dby;
        }
        return;
    }

    let (mut ax2, mut ay2) = (ax / 2, ay / 2);
    let (mut bx2, mut by2) = (bx / 2, by / 2);
    let w2 = (ax2 + ay2).abs();
    let h2 = (bx2 + by2).abs();

    if 2 * w > 3 * h {
        if w2 % 2 != 0 && w > 2 {
            ax2 += dax;
            ay2 += day;
        }
        generate2d(x, y, ax2, ay2, bx, by, visit);
        generate2d(x + ax2, y + ay2, ax - ax2, ay - ay2, bx, by, visit);
        return;
    }

    if h2 % 2 != 0 && h > 2 {
        bx2 += dbx;
        by2 += dby;
    }

    generate2d(x, y, bx2, by2, ax2, ay2, visit);
    generate2d(x + bx2, y + by2, ax, ay, bx - bx2, by - by2, visit);
    generate2d(
        x + (ax - dax) + (bx2 - dbx),
        y + (ay - day) + (by2 - dby),
        -bx2,
        -by2,
        -(ax - ax2),
        -(ay - ay2),
        visit,
    );
}
