//! Framed codecs for both directions of the wire. `CoordinatorCodec` is the
//! coordinator's side (encodes `CoordinatorMsg`, decodes `WorkerMsg`);
//! `WorkerCodec` is the mirror image.

use crate::{CoordinatorMsg, WorkerMsg};

utils::codec!(CoordinatorCodec, encode: CoordinatorMsg, decode: WorkerMsg);
utils::codec!(WorkerCodec, encode: WorkerMsg, decode: CoordinatorMsg);

#[cfg(test)]
mod tests {
    use utils::macros::codec::bytes::{BufMut, BytesMut};
    use utils::macros::codec::tokio_util::codec::{Decoder, Encoder};

    use super::*;
    use crate::handshake::{JoinAck, JoinReq};
    use crate::worker_msg::{JobFailure, JobReport};
    use crate::{JobSpec, OperatorKind, ToneParams, WorkerId};

    fn spec(file_name: &str) -> JobSpec {
        JobSpec {
            images_path: "/data/hdr images".into(),
            dst_path: "".into(),
            file_name: file_name.to_string(),
            operator: OperatorKind::AdaptiveLog,
            params: ToneParams {
                f_stop: -2.5,
                gamma: 2.2,
                q: 0.0,
                k: f32::MAX,
                b: 0.85,
                ld_max: 100.0,
            },
            block_size: 32,
        }
    }

    fn to_worker(msg: CoordinatorMsg) -> CoordinatorMsg {
        let mut buf = BytesMut::new();
        CoordinatorCodec::new().encode(msg, &mut buf).unwrap();
        WorkerCodec::new().decode(&mut buf).unwrap().unwrap()
    }

    fn to_coordinator(msg: WorkerMsg) -> WorkerMsg {
        let mut buf = BytesMut::new();
        WorkerCodec::new().encode(msg, &mut buf).unwrap();
        CoordinatorCodec::new().decode(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn work_envelope_round_trips() {
        let msg = CoordinatorMsg::Work(spec("memorial with spaces.hdr"));
        assert_eq!(to_worker(msg.clone()), msg);
    }

    #[test]
    fn work_envelope_round_trips_empty_strings() {
        let msg = CoordinatorMsg::Work(spec(""));
        assert_eq!(to_worker(msg.clone()), msg);
    }

    #[test]
    fn control_envelopes_round_trip() {
        assert_eq!(to_worker(CoordinatorMsg::Finish), CoordinatorMsg::Finish);
        let welcome = CoordinatorMsg::Welcome(JoinAck {
            worker_id: WorkerId::from(7),
        });
        assert_eq!(to_worker(welcome.clone()), welcome);
    }

    #[test]
    fn reports_round_trip() {
        let join = WorkerMsg::Join(JoinReq { pid: 4242 });
        assert_eq!(to_coordinator(join.clone()), join);

        let done = WorkerMsg::Done(JobReport {
            worker_id: WorkerId::from(3),
            elapsed: 0.0317,
            file_name: "memorial.hdr".to_string(),
        });
        assert_eq!(to_coordinator(done.clone()), done);

        let failed = WorkerMsg::Failed(JobFailure {
            worker_id: WorkerId::from(1),
            file_name: "broken.hdr".to_string(),
            error: "read /in/broken.hdr: no such file".to_string(),
        });
        assert_eq!(to_coordinator(failed.clone()), failed);
    }

    #[test]
    fn partial_frames_stay_buffered_until_complete() {
        let mut encoded = BytesMut::new();
        CoordinatorCodec::new()
            .encode(CoordinatorMsg::Work(spec("a.hdr")), &mut encoded)
            .unwrap();

        let mut decoder = WorkerCodec::new();
        let split = encoded.len() / 2;
        let rest = encoded.split_off(split);

        let mut buf = encoded;
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&rest);
        let decoded = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, CoordinatorMsg::Work(spec("a.hdr")));
    }

    #[test]
    fn garbage_frame_is_an_error_not_a_desync() {
        let mut buf = BytesMut::new();
        buf.put_u32(4);
        buf.put_slice(&[0xFF; 4]);
        assert!(WorkerCodec::new().decode(&mut buf).is_err());
    }
}
