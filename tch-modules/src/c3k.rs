use crate::{bottleneck::*, common::*, conv_block::*};

#[derive(Debug, Clone)]
pub struct C3kInit {
    pub in_c: usize,
    pub out_c: usize,
    pub repeat: usize,
    pub activation: Activation,
}

impl C3kInit {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self {
            in_c,
            out_c,
            repeat: 2,
            activation: Activation::Silu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<C3k>
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

        ensure!(repeat > 0, "C3k needs at least one bottleneck");
        let mid_c = in_c / 2;
        ensure!(mid_c > 0, "C3k input channels must be at least 2, but get {}", in_c);

        let conv1 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c, mid_c, 1)
        }
        .build(path / "conv1")?;
        let conv2 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c, mid_c, 1)
        }
        .build(path / "conv2")?;
        let conv3 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(mid_c * 2, out_c, 1)
        }
        .build(path / "conv3")?;
        let bottlenecks: Vec<_> = (0..repeat)
            .map(|index| {
                ResidualBottleneckInit {
                    activation,
                    ..ResidualBottleneckInit::new(mid_c, mid_c)
                }
                .build(path / format!("bottleneck_{}", index))
            })
            .collect::<Result<_>>()?;

        Ok(C3k {
            conv1,
            conv2,
            conv3,
            bottlenecks,
        })
    }
}

/// Cross-stage block: a bottleneck branch and a projection branch,
/// concatenated and fused by a 1x1 convolution.
#[derive(Debug)]
pub struct C3k {
    conv1: ConvBlock,
    conv2: ConvBlock,
    conv3: ConvBlock,
    bottlenecks: Vec<ResidualBottleneck>,
}

impl C3k {
    pub fn in_c(&self) -> usize {
        self.conv1.in_c()
    }

    pub fn out_c(&self) -> usize {
        self.conv3.out_c()
    }
}

impl nn::Module for C3k {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let Self {
            ref conv1,
            ref conv2,
            ref conv3,
            ref bottlenecks,
        } = *self;

        let main = bottlenecks
            .iter()
            .fold(xs.apply(conv1), |ys, bottleneck| ys.apply(bottleneck));
        let skip = xs.apply(conv2);
        Tensor::cat(&[main, skip], 1).apply(conv3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn c3k_output_shape() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let block = C3kInit::new(32, 48).build(&vs.root())?;
        assert_eq!((block.in_c(), block.out_c()), (32, 48));

        let ys = Tensor::randn(&[2, 32, 8, 6], FLOAT_CPU).apply(&block);
        assert_eq!(ys.size(), vec![2, 48, 8, 6]);
        Ok(())
    }

    #[test]
    fn reject_zero_repeat() {
        let vs = nn::VarStore::new(Device::Cpu);
        let result = C3kInit {
            repeat: 0,
            ..C3kInit::new(32, 32)
        }
        .build(&vs.root());
        assert!(result.is_err());
    }
}
