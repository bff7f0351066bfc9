use candle_core::{Device, Tensor};
use crate::batch::Batch;

impl Batch {
    /// Lays the batch out as a `u32` tensor of shape `(items, length)`.
    ///
    /// Row `i` holds the token ids of the `i`th sequence, so row order matches
    /// [`Batch::indices`].
    ///
    /// # Parameters
    ///
    /// * `device` - Device to allocate the tensor on
    ///
    /// # Returns
    ///
    /// A tensor whose [`BATCH_DIM`](crate::constant::BATCH_DIM) is the item count and whose
    /// [`SEQ_DIM`](crate::constant::SEQ_DIM) is the shared sequence length
    pub fn to_tensor(&self, device: &Device) -> candle_core::Result<Tensor> {
        let ids: Vec<u32> = self
            .iter()
            .flat_map(|sequence| sequence.ids().iter().copied())
            .collect();
        Tensor::from_vec(ids, (self.item_count(), self.sequence_length()), device)
    }
}
