use serde::{Deserialize, Serialize};

/// System images pinned for one Kubernetes version.
///
/// Field order matters: [`SystemImages::entries`] walks the fields in declaration
/// order, and that order is what image listings preserve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemImages {
    pub etcd: String,
    pub alpine: String,
    pub nginx_proxy: String,
    pub cert_downloader: String,
    pub kubernetes_services_sidecar: String,
    pub kubedns: String,
    pub dnsmasq: String,
    pub kubedns_sidecar: String,
    pub kubedns_autoscaler: String,
    pub coredns: String,
    pub coredns_autoscaler: String,
    pub nodelocal: String,
    pub kubernetes: String,
    pub flannel: String,
    pub flannel_cni: String,
    pub calico_node: String,
    pub calico_cni: String,
    pub calico_controllers: String,
    pub calico_ctl: String,
    pub calico_flex_vol: String,
    pub canal_node: String,
    pub canal_cni: String,
    pub canal_controllers: String,
    pub canal_flannel: String,
    pub canal_flex_vol: String,
    pub weave_node: String,
    pub weave_cni: String,
    pub pod_infra_container: String,
    pub ingress: String,
    pub ingress_backend: String,
    pub ingress_webhook: String,
    pub metrics_server: String,
    pub windows_pod_infra_container: String,
    pub aci_cni_deploy_container: String,
    pub aci_host_container: String,
    pub aci_opflex_container: String,
    pub aci_mcast_container: String,
    pub aci_openv_switch_container: String,
    pub aci_controller_container: String,
    pub aci_gbp_server_container: String,
    pub aci_opflex_server_container: String,
}

impl SystemImages {
    /// Every component as `(json field name, image reference)`, empty references included.
    pub fn entries(&self) -> [(&'static str, &str); 41] {
        [
            ("etcd", &self.etcd),
            ("alpine", &self.alpine),
            ("nginxProxy", &self.nginx_proxy),
            ("certDownloader", &self.cert_downloader),
            ("kubernetesServicesSidecar", &self.kubernetes_services_sidecar),
            ("kubedns", &self.kubedns),
            ("dnsmasq", &self.dnsmasq),
            ("kubednsSidecar", &self.kubedns_sidecar),
            ("kubednsAutoscaler", &self.kubedns_autoscaler),
            ("coredns", &self.coredns),
            ("corednsAutoscaler", &self.coredns_autoscaler),
            ("nodelocal", &self.nodelocal),
            ("kubernetes", &self.kubernetes),
            ("flannel", &self.flannel),
            ("flannelCni", &self.flannel_cni),
            ("calicoNode", &self.calico_node),
            ("calicoCni", &self.calico_cni),
            ("calicoControllers", &self.calico_controllers),
            ("calicoCtl", &self.calico_ctl),
            ("calicoFlexVol", &self.calico_flex_vol),
            ("canalNode", &self.canal_node),
            ("canalCni", &self.canal_cni),
            ("canalControllers", &self.canal_controllers),
            ("canalFlannel", &self.canal_flannel),
            ("canalFlexVol", &self.canal_flex_vol),
            ("weaveNode", &self.weave_node),
            ("weaveCni", &self.weave_cni),
            ("podInfraContainer", &self.pod_infra_container),
            ("ingress", &self.ingress),
            ("ingressBackend", &self.ingress_backend),
            ("ingressWebhook", &self.ingress_webhook),
            ("metricsServer", &self.metrics_server),
            ("windowsPodInfraContainer", &self.windows_pod_infra_container),
            ("aciCniDeployContainer", &self.aci_cni_deploy_container),
            ("aciHostContainer", &self.aci_host_container),
            ("aciOpflexContainer", &self.aci_opflex_container),
            ("aciMcastContainer", &self.aci_mcast_container),
            ("aciOpenvSwitchContainer", &self.aci_openv_switch_container),
            ("aciControllerContainer", &self.aci_controller_container),
            ("aciGbpServerContainer", &self.aci_gbp_server_container),
            ("aciOpflexServerContainer", &self.aci_opflex_server_container),
        ]
    }

    /// Non-empty image references in field order. May contain duplicates.
    pub fn references(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries()
            .into_iter()
            .map(|(_, image)| image)
            .filter(|image| !image.is_empty())
    }
}
