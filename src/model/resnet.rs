//! ResNet Architecture for Plant Disease Classification
//!
//! A ResNet built from basic residual blocks. Field names follow the
//! torchvision layout (`conv1`, `bn1`, `layer1`..`layer4`, `fc`) so the
//! official ImageNet checkpoints map onto it with minimal key remapping.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Channels produced by each of the four stages
const STAGE_CHANNELS: [usize; 4] = [64, 128, 256, 512];

/// Width of the pooled feature vector fed to the classifier
pub const FEATURE_DIM: usize = 512;

/// Configuration for the ResNet model
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Number of output classes (ImageNet head by default)
    #[config(default = "1000")]
    pub num_classes: usize,

    /// Residual blocks per stage ([2, 2, 2, 2] is ResNet-18)
    #[config(default = "[2, 2, 2, 2]")]
    pub layers: [usize; 4],
}

impl ResNetConfig {
    /// ResNet-18 with the given head width
    pub fn resnet18(num_classes: usize) -> Self {
        Self::new().with_num_classes(num_classes)
    }

    /// Initialize a model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        ResNet::new(self, device)
    }
}

/// 1x1 projection on the shortcut path when shape changes
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B>,
}

impl<B: Backend> Downsample<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_stride([stride, stride])
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);

        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

/// Basic residual block: two 3x3 convolutions plus a shortcut
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B>,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B>,
    pub relu: Relu,
    pub downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        let downsample = (stride != 1 || in_channels != out_channels)
            .then(|| Downsample::new(in_channels, out_channels, stride, device));

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            relu: Relu::new(),
            downsample,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(x.clone()),
            None => x.clone(),
        };

        let out = self.conv1.forward(x);
        let out = self.bn1.forward(out);
        let out = self.relu.forward(out);
        let out = self.conv2.forward(out);
        let out = self.bn2.forward(out);

        self.relu.forward(out + identity)
    }
}

fn make_stage<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    blocks: usize,
    stride: usize,
    device: &B::Device,
) -> Vec<BasicBlock<B>> {
    (0..blocks)
        .map(|i| {
            if i == 0 {
                BasicBlock::new(in_channels, out_channels, stride, device)
            } else {
                BasicBlock::new(out_channels, out_channels, 1, device)
            }
        })
        .collect()
}

/// ResNet image classifier
///
/// Architecture:
/// - 7x7 stem convolution (stride 2) + BatchNorm + ReLU + 3x3 max-pool
/// - Four stages of basic blocks (64, 128, 256, 512 channels)
/// - Global average pooling
/// - Fully connected classifier `fc`
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B>,
    pub relu: Relu,
    pub maxpool: MaxPool2d,
    pub layer1: Vec<BasicBlock<B>>,
    pub layer2: Vec<BasicBlock<B>>,
    pub layer3: Vec<BasicBlock<B>>,
    pub layer4: Vec<BasicBlock<B>>,
    pub avgpool: AdaptiveAvgPool2d,
    pub fc: Linear<B>,
}

impl<B: Backend> ResNet<B> {
    /// Create a new ResNet from configuration
    pub fn new(config: &ResNetConfig, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([3, STAGE_CHANNELS[0]], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(STAGE_CHANNELS[0]).init(device);

        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let [c1, c2, c3, c4] = STAGE_CHANNELS;
        let [n1, n2, n3, n4] = config.layers;

        let layer1 = make_stage(c1, c1, n1, 1, device);
        let layer2 = make_stage(c1, c2, n2, 2, device);
        let layer3 = make_stage(c2, c3, n3, 2, device);
        let layer4 = make_stage(c3, c4, n4, 2, device);

        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let fc = LinearConfig::new(FEATURE_DIM, config.num_classes).init(device);

        Self {
            conv1,
            bn1,
            relu: Relu::new(),
            maxpool,
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool,
            fc,
        }
    }

    /// Pooled backbone features `[batch, 512]`
    pub fn features(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);
        let mut x = self.maxpool.forward(x);

        for block in self
            .layer1
            .iter()
            .chain(&self.layer2)
            .chain(&self.layer3)
            .chain(&self.layer4)
        {
            x = block.forward(x);
        }

        let x = self.avgpool.forward(x);
        x.flatten(1, 3)
    }

    /// Forward pass returning logits `[batch, num_classes]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.fc.forward(self.features(input))
    }

    /// Class probabilities
    pub fn forward_softmax(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(input), 1)
    }

    /// Replace the classification head with a freshly initialised one
    ///
    /// The backbone (everything but `fc`) keeps its weights.
    pub fn with_classifier(mut self, num_classes: usize, device: &B::Device) -> Self {
        self.fc = LinearConfig::new(FEATURE_DIM, num_classes).init(device);
        self
    }

    /// Width of the classification head
    pub fn num_classes(&self) -> usize {
        self.fc.weight.dims()[1]
    }
}
