use crate::error::{FactoryError, Result};
use std::any::Any;

/// Context handed to a codec for create and recreate calls
///
/// `bytes` borrows the factory's stream buffer and is only valid for the
/// duration of the call; codecs must copy what they keep. `name` is the
/// caller-supplied name on create and the stored canonical path on recreate.
pub struct LoadContext<'a> {
    pub bytes: &'a [u8],
    pub name: &'a str,
}

/// Codec registered for one file extension
///
/// State the codec needs (device handles, parser tables, ...) lives on the
/// implementing value itself.
pub trait ResourceCodec: Send + Sync {
    /// Decode `ctx.bytes` into a payload value
    fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>>;

    /// Hook invoked when the last reference is released
    ///
    /// Runs while the descriptor is still present in every factory index, so
    /// auxiliary state keyed by the payload is still reachable. Dropping the
    /// payload value itself is handled by the factory.
    fn destroy(&self, _payload: &mut (dyn Any + Send + Sync)) {}

    /// Refresh the payload in place from new file contents
    ///
    /// Must mutate through `payload` so outstanding handles stay valid; the
    /// payload's identity may not change.
    fn recreate(&self, _ctx: LoadContext, _payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
        Err(FactoryError::ReloadUnsupported)
    }

    /// Whether this codec implements `recreate`
    fn supports_reload(&self) -> bool {
        false
    }
}

/// Raw bytes codec
pub struct BinaryCodec;

impl ResourceCodec for BinaryCodec {
    fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(ctx.bytes.to_vec()))
    }

    fn recreate(&self, ctx: LoadContext, payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
        let data = payload
            .downcast_mut::<Vec<u8>>()
            .ok_or_else(|| FactoryError::CodecFailure("payload is not Vec<u8>".to_string()))?;
        data.clear();
        data.extend_from_slice(ctx.bytes);
        Ok(())
    }

    fn supports_reload(&self) -> bool {
        true
    }
}

/// UTF-8 text codec
pub struct TextCodec;

impl ResourceCodec for TextCodec {
    fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>> {
        let content = std::str::from_utf8(ctx.bytes)
            .map_err(|e| FactoryError::CodecFailure(format!("UTF-8 decode error: {e}")))?;
        Ok(Box::new(content.to_string()))
    }

    fn recreate(&self, ctx: LoadContext, payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
        let content = std::str::from_utf8(ctx.bytes)
            .map_err(|e| FactoryError::CodecFailure(format!("UTF-8 decode error: {e}")))?;
        let text = payload
            .downcast_mut::<String>()
            .ok_or_else(|| FactoryError::CodecFailure("payload is not String".to_string()))?;
        text.clear();
        text.push_str(content);
        Ok(())
    }

    fn supports_reload(&self) -> bool {
        true
    }
}

/// JSON document codec
pub struct JsonCodec;

impl ResourceCodec for JsonCodec {
    fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>> {
        let value: serde_json::Value = serde_json::from_slice(ctx.bytes)
            .map_err(|e| FactoryError::CodecFailure(format!("JSON parse error: {e}")))?;
        Ok(Box::new(value))
    }

    fn recreate(&self, ctx: LoadContext, payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
        let value: serde_json::Value = serde_json::from_slice(ctx.bytes)
            .map_err(|e| FactoryError::CodecFailure(format!("JSON parse error: {e}")))?;
        let slot = payload
            .downcast_mut::<serde_json::Value>()
            .ok_or_else(|| FactoryError::CodecFailure("payload is not a JSON value".to_string()))?;
        *slot = value;
        Ok(())
    }

    fn supports_reload(&self) -> bool {
        true
    }
}
