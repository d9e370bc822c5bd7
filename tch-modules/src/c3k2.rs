use crate::{c3k::*, common::*, conv_block::*};

#[derive(Debug, Clone)]
pub struct C3k2Init {
    pub in_c: usize,
    pub out_c: usize,
    /// Number of bottlenecks in the inner C3k block.
    pub repeat: usize,
    pub activation: Activation,
}

impl C3k2Init {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self {
            in_c,
            out_c,
            repeat: 2,
            activation: Activation::Silu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<C3k2>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            repeat,
            activation,
        } = self;

        let half_c = in_c / 2;
        ensure!(
            half_c > 0,
            "C3k2 input channels must be at least 2, but get {}",
            in_c
        );

        let conv1 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c, in_c, 1)
        }
        .build(path / "conv1")?;
        let c3k = C3kInit {
            in_c,
            out_c: half_c,
            repeat,
            activation,
        }
        .build(path / "c3k")?;
        let conv2 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c + half_c, out_c, 1)
        }
        .build(path / "conv2")?;

        Ok(C3k2 { conv1, c3k, conv2 })
    }
}

/// Wraps a [C3k] block and concatenates its output with the raw input.
#[derive(Debug)]
pub struct C3k2 {
    conv1: ConvBlock,
    c3k: C3k,
    conv2: ConvBlock,
}

impl C3k2 {
    pub fn in_c(&self) -> usize {
        self.conv1.in_c()
    }

    pub fn out_c(&self) -> usize {
        self.conv2.out_c()
    }
}

impl nn::Module for C3k2 {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let Self {
            ref conv1,
            ref c3k,
            ref conv2,
        } = *self;

        let ys = xs.apply(conv1).apply(c3k);
        Tensor::cat(&[&ys, xs], 1).apply(conv2)
    }
}
