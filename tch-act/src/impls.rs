use crate::Activation;
use tch::{nn, Tensor};

impl nn::Module for Activation {
    fn forward(&self, xs: &Tensor) -> Tensor {
        use Activation::*;

        match *self {
            Silu => silu(xs),
            Mish => xs.mish(),
            HardSwish => hard_swish(xs),
            Relu => xs.relu(),
            LeakyRelu => leaky_relu_ext(xs, None),
            Sigmoid => xs.sigmoid(),
            Identity => xs.shallow_clone(),
        }
    }
}

pub fn silu(tensor: &Tensor) -> Tensor {
    tensor * tensor.sigmoid()
}

pub fn hard_swish(tensor: &Tensor) -> Tensor {
    tensor * (tensor + 3.0).clamp(0.0, 6.0) / 6.0
}

pub fn leaky_relu_ext(tensor: &Tensor, negative_slope: Option<f64>) -> Tensor {
    tensor.maximum(&(tensor * negative_slope.unwrap_or(0.01)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{kind::FLOAT_CPU, nn::Module};

    #[test]
    fn identity_keeps_values() {
        let xs = Tensor::randn(&[2, 3, 4, 4], FLOAT_CPU);
        let ys = Activation::Identity.forward(&xs);
        assert_eq!(ys, xs);
    }

    #[test]
    fn silu_is_zero_at_origin() {
        let xs = Tensor::of_slice(&[0f32, 10.0]);
        let ys = Vec::<f32>::from(&Activation::Silu.forward(&xs));
        assert_eq!(ys[0], 0.0);
        assert!((ys[1] - 10.0).abs() < 1e-3);
    }
}
