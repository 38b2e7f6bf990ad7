//! Media gateway variants implementing the uniform bidirectional-audio
//! contract (§4.1): browser, SIP, and telephony-provider.

pub mod channel;
pub mod codec;
pub mod gateway;

pub use channel::ChannelGateway;
pub use codec::{MuLawCodec, PcmPassthroughCodec};
pub use gateway::MediaGateway;

/// Browser transport: already 16 kHz PCM16LE, no resampling needed.
pub type BrowserGateway = ChannelGateway<PcmPassthroughCodec>;

/// SIP/RTP transport: G.711 mu-law at 8 kHz, resampled at the boundary.
pub type SipGateway = ChannelGateway<MuLawCodec>;

/// Telephony-provider transport (e.g. a Twilio Media Streams bridge):
/// 16 kHz PCM16LE, same wire shape as the browser variant.
pub type TelephonyProviderGateway = ChannelGateway<PcmPassthroughCodec>;
