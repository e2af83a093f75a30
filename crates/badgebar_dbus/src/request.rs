use tokio::sync::{mpsc::UnboundedSender, oneshot};

use crate::ServiceError;

/// Answer channel of a forwarded request. The tick thread sends exactly one value into it.
pub type Reply<T> = oneshot::Sender<std::result::Result<T, ServiceError>>;

/// Send a request to the tick thread and wait for its answer.
///
/// A closed request channel means the receiving group never finished its setup or was already
/// cleaned up; a dropped reply means it went away while the request was queued.
pub(crate) async fn forward<R, T, F>(requests: &UnboundedSender<R>, receiver: &str, make: F) -> std::result::Result<T, ServiceError>
where
    F: FnOnce(Reply<T>) -> R,
{
    let (reply, response) = oneshot::channel();
    if requests.send(make(reply)).is_err() {
        return Err(ServiceError::Unavailable(format!("{} is not running", receiver)));
    }
    match response.await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Unavailable(format!("{} dropped the request", receiver))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_forward_to_closed_channel_is_unavailable() {
        let (send, recv) = tokio::sync::mpsc::unbounded_channel::<Reply<u32>>();
        drop(recv);
        let result = forward(&send, "test receiver", |reply| reply).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_forward_returns_answer() {
        let (send, mut recv) = tokio::sync::mpsc::unbounded_channel::<Reply<u32>>();
        let answer = tokio::spawn(async move {
            let reply = recv.recv().await.unwrap();
            let _ = reply.send(Ok(42));
        });
        let result = forward(&send, "test receiver", |reply| reply).await;
        answer.await.unwrap();
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_forward_with_dropped_reply_is_unavailable() {
        let (send, mut recv) = tokio::sync::mpsc::unbounded_channel::<Reply<u32>>();
        let answer = tokio::spawn(async move {
            drop(recv.recv().await);
        });
        let result = forward(&send, "test receiver", |reply| reply).await;
        answer.await.unwrap();
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }
}
