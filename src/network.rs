//! Recurrent phenotype network built from a genome.
//!
//! [`RecurrentNetwork`] is the runnable form of a [`Genome`](crate::Genome).
//! Neurons are addressed by dense indices: inputs `[0, i)`, hidden `[i, i+h)`,
//! outputs `[i+h, i+h+o)`. Each call to [`activate`](RecurrentNetwork::activate)
//! performs one time step; hidden and output state carry over between calls, so
//! recurrent and feedback links see the previous step's values.

use crate::activation::Activation;
use crate::gene::NeuronCounts;

/// One-step recurrent network with retained state.
///
/// Weights live in flat row-major matrices, one row per target neuron.
#[derive(Debug, Clone)]
pub struct RecurrentNetwork {
    dims: NeuronCounts,
    activation: Activation,
    /// input -> hidden, `hidden x inputs`.
    w_input: Vec<f32>,
    /// hidden -> hidden, `hidden x hidden`.
    w_hidden: Vec<f32>,
    /// output -> hidden feedback, `hidden x outputs`.
    w_feedback: Vec<f32>,
    /// (input, hidden) -> output, `outputs x (inputs + hidden)`.
    w_output: Vec<f32>,
    hidden_state: Vec<f32>,
    output_state: Vec<f32>,
    /// Scratch buffer for the next hidden state.
    hidden_next: Vec<f32>,
}

/// Kind of a dense neuron index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Input(usize),
    Hidden(usize),
    Output(usize),
}

impl RecurrentNetwork {
    /// Create a network with no links and zeroed state.
    #[must_use]
    pub fn new(dims: NeuronCounts, activation: Activation) -> Self {
        let NeuronCounts {
            inputs,
            hidden,
            outputs,
        } = dims;
        Self {
            dims,
            activation,
            w_input: vec![0.0; hidden * inputs],
            w_hidden: vec![0.0; hidden * hidden],
            w_feedback: vec![0.0; hidden * outputs],
            w_output: vec![0.0; outputs * (inputs + hidden)],
            hidden_state: vec![0.0; hidden],
            output_state: vec![0.0; outputs],
            hidden_next: vec![0.0; hidden],
        }
    }

    /// `(inputs, hidden, outputs)` of this network.
    #[must_use]
    pub const fn dims(&self) -> NeuronCounts {
        self.dims
    }

    #[must_use]
    pub const fn activation(&self) -> Activation {
        self.activation
    }

    /// Change the activation applied to hidden and output neurons.
    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    fn slot(&self, index: usize) -> Option<Slot> {
        let NeuronCounts {
            inputs,
            hidden,
            outputs,
        } = self.dims;
        if index < inputs {
            Some(Slot::Input(index))
        } else if index < inputs + hidden {
            Some(Slot::Hidden(index - inputs))
        } else if index < inputs + hidden + outputs {
            Some(Slot::Output(index - inputs - hidden))
        } else {
            None
        }
    }

    /// Set the weight of the link `inode -> onode` (dense indices).
    ///
    /// Legal links are input->hidden, input->output, hidden->hidden,
    /// hidden->output and output->hidden. Returns `false` for anything else.
    pub fn add_link(&mut self, inode: usize, onode: usize, weight: f32) -> bool {
        let NeuronCounts {
            inputs,
            hidden,
            outputs,
        } = self.dims;

        let cell = match (self.slot(inode), self.slot(onode)) {
            (Some(Slot::Input(i)), Some(Slot::Hidden(h))) => &mut self.w_input[h * inputs + i],
            (Some(Slot::Hidden(from)), Some(Slot::Hidden(to))) => {
                &mut self.w_hidden[to * hidden + from]
            }
            (Some(Slot::Output(o)), Some(Slot::Hidden(h))) => {
                &mut self.w_feedback[h * outputs + o]
            }
            (Some(Slot::Input(i)), Some(Slot::Output(o))) => {
                &mut self.w_output[o * (inputs + hidden) + i]
            }
            (Some(Slot::Hidden(h)), Some(Slot::Output(o))) => {
                &mut self.w_output[o * (inputs + hidden) + inputs + h]
            }
            _ => {
                log::debug!("cannot add link from {inode} to {onode}");
                return false;
            }
        };
        *cell = weight;
        true
    }

    /// Run one time step, writing the outputs into `outputs`.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` or `outputs` do not match the network's dimensions.
    pub fn activate_into(&mut self, inputs: &[f32], outputs: &mut [f32]) {
        let NeuronCounts {
            inputs: num_inputs,
            hidden: num_hidden,
            outputs: num_outputs,
        } = self.dims;
        assert_eq!(
            inputs.len(),
            num_inputs,
            "Input length mismatch: expected {}, got {}",
            num_inputs,
            inputs.len()
        );
        assert_eq!(
            outputs.len(),
            num_outputs,
            "Output length mismatch: expected {}, got {}",
            num_outputs,
            outputs.len()
        );

        // h' = f(Wi x + Wh h + Wb o)
        for h in 0..num_hidden {
            let mut sum = dot(&self.w_input[h * num_inputs..(h + 1) * num_inputs], inputs);
            sum += dot(
                &self.w_hidden[h * num_hidden..(h + 1) * num_hidden],
                &self.hidden_state,
            );
            sum += dot(
                &self.w_feedback[h * num_outputs..(h + 1) * num_outputs],
                &self.output_state,
            );
            self.hidden_next[h] = self.activation.apply(sum);
        }
        std::mem::swap(&mut self.hidden_state, &mut self.hidden_next);

        // o' = f(Wo [x; h'])
        let width = num_inputs + num_hidden;
        for o in 0..num_outputs {
            let row = &self.w_output[o * width..(o + 1) * width];
            let sum = dot(&row[..num_inputs], inputs) + dot(&row[num_inputs..], &self.hidden_state);
            self.output_state[o] = self.activation.apply(sum);
        }

        outputs.copy_from_slice(&self.output_state);
    }

    /// Run one time step and return the outputs.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not match the number of input neurons.
    pub fn activate(&mut self, inputs: &[f32]) -> Vec<f32> {
        let mut outputs = vec![0.0; self.dims.outputs];
        self.activate_into(inputs, &mut outputs);
        outputs
    }

    /// Clear hidden and output state.
    pub fn reset(&mut self) {
        self.hidden_state.fill(0.0);
        self.output_state.fill(0.0);
    }
}

#[inline]
fn dot(weights: &[f32], values: &[f32]) -> f32 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let network = RecurrentNetwork::new(NeuronCounts::new(2, 5, 3), Activation::Identity);
        assert_eq!(network.dims(), NeuronCounts::new(2, 5, 3));
        assert_eq!(network.w_input.len(), 10);
        assert_eq!(network.w_hidden.len(), 25);
        assert_eq!(network.w_feedback.len(), 15);
        assert_eq!(network.w_output.len(), 21);
    }

    #[test]
    fn test_add_link_kinds() {
        let mut network = RecurrentNetwork::new(NeuronCounts::new(2, 2, 2), Activation::Identity);

        assert!(!network.add_link(0, 0, 1.1));
        assert!(network.add_link(0, 2, 1.2));
        assert!(network.add_link(0, 4, 1.3));
        assert!(!network.add_link(2, 0, 1.4));
        assert!(network.add_link(2, 3, 1.5));
        assert!(network.add_link(2, 4, 1.6));
        assert!(!network.add_link(4, 0, 1.7));
        assert!(!network.add_link(4, 5, 1.8));
        assert!(network.add_link(4, 2, 1.9));
        assert!(!network.add_link(0, 6, 2.0));

        assert!((network.w_input[0] - 1.2).abs() < 1e-6);
        assert!((network.w_output[0] - 1.3).abs() < 1e-6);
        assert!((network.w_hidden[2] - 1.5).abs() < 1e-6);
        assert!((network.w_output[2] - 1.6).abs() < 1e-6);
        assert!((network.w_feedback[0] - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_activate() {
        let mut network = RecurrentNetwork::new(NeuronCounts::new(2, 2, 1), Activation::Identity);
        for (from, to) in [(0, 2), (0, 3), (1, 2), (1, 3), (2, 4), (3, 4)] {
            network.add_link(from, to, 1.0);
        }

        let outputs = network.activate(&[1.0, 1.0]);
        assert_eq!(outputs.len(), 1);
        assert!((outputs[0] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_state_carries_over() {
        // x -> h, h -> h: the hidden neuron accumulates across steps
        let mut network = RecurrentNetwork::new(NeuronCounts::new(1, 1, 1), Activation::Identity);
        network.add_link(0, 1, 1.0);
        network.add_link(1, 1, 1.0);
        network.add_link(1, 2, 1.0);

        assert!((network.activate(&[1.0])[0] - 1.0).abs() < 1e-6);
        assert!((network.activate(&[1.0])[0] - 2.0).abs() < 1e-6);
        assert!((network.activate(&[1.0])[0] - 3.0).abs() < 1e-6);

        network.reset();
        assert!((network.activate(&[1.0])[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_activation_applied() {
        let mut network = RecurrentNetwork::new(NeuronCounts::new(1, 0, 1), Activation::Sigmoid);
        network.add_link(0, 1, 0.0);
        let outputs = network.activate(&[3.0]);
        assert!((outputs[0] - 0.5).abs() < 1e-6);

        network.set_activation(Activation::Identity);
        assert_eq!(network.activation(), Activation::Identity);
        assert!(network.activate(&[3.0])[0].abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "Input length mismatch")]
    fn test_input_mismatch() {
        let mut network = RecurrentNetwork::new(NeuronCounts::new(2, 0, 1), Activation::Identity);
        network.activate(&[1.0]);
    }
}
