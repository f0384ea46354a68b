use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc::UnboundedSender;

/// Spawn a blocking thread that reads operator lines and forwards them to the capture loop.
///
/// Lines are sent without their line terminator, so a bare <Enter> arrives as an empty
/// string. The thread ends at end of input or when the receiver is gone; dropping the
/// sender tells the capture loop that no more operator input will come.
pub fn spawn_operator_thread<R>(input: R, tx: UnboundedSender<String>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut input = input;
        let mut line = String::new();
        loop {
            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let text = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(text).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("operator input error: {}", err);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::sync::mpsc;

    #[test]
    fn forwards_lines_without_terminators() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input = Cursor::new(b"note one\r\n\nsecond\n".to_vec());

        spawn_operator_thread(input, tx).join().unwrap();

        let mut received = Vec::new();
        while let Ok(text) = rx.try_recv() {
            received.push(text);
        }
        assert_eq!(received, vec!["note one", "", "second"]);
    }

    #[test]
    fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let input = Cursor::new(b"a\nb\n".to_vec());

        spawn_operator_thread(input, tx).join().unwrap();
    }
}
