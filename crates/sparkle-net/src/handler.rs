use crate::Msg;

/// Receiver of decoded, addressed messages
///
/// Called on the network activity for every accepted frame, in arrival order.
/// Must not block. The payload borrows the slinger's receive buffer, which is
/// reused once the call returns.
pub trait MsgHandler {
    fn handle_msg(&mut self, msg: &Msg<'_>);
}

impl<H: MsgHandler + ?Sized> MsgHandler for &mut H {
    fn handle_msg(&mut self, msg: &Msg<'_>) {
        (**self).handle_msg(msg);
    }
}
